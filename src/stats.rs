//! Public read and write operations: statistics views, guestbook
//! submission and booth management.

use crate::access::{self, Caller};
use crate::aggregator::{Aggregator, GroupField};
use crate::config::Context;
use crate::error::{ApiError, StoreError};
use crate::models::{Booth, BoothStats, EntryCreated, EntryRequest, GlobalStats};
use crate::store::EntryStore;
use crate::validation;

pub fn global_stats<S: EntryStore + ?Sized>(store: &mut S, ctx: &Context, caller: &Caller) -> Result<GlobalStats, ApiError> {
    access::authorize_global_stats(caller).into_result()?;

    let total_booths = store.count_booths()?;
    let mut agg = Aggregator::new(store, &*ctx.clock);

    Ok(GlobalStats {
        total_participants: agg.count_all(None)?,
        total_booths,
        gender_stats: agg.group_by(GroupField::Gender, None)?,
        school_level_stats: agg.group_by(GroupField::SchoolLevel, None)?,
        timeline_stats: agg.timeline_today(None)?,
    })
}

/// An unknown booth id yields all-zero statistics rather than an error.
pub fn booth_stats<S: EntryStore + ?Sized>(
    store: &mut S,
    ctx: &Context,
    caller: &Caller,
    booth_id: i32,
) -> Result<BoothStats, ApiError> {
    access::authorize_booth_stats(caller, booth_id).into_result()?;

    let mut agg = Aggregator::new(store, &*ctx.clock);

    Ok(BoothStats {
        total_participants: agg.count_all(Some(booth_id))?,
        recent_participants: agg.count_recent(booth_id, ctx.recent_window)?,
        gender_stats: agg.group_by(GroupField::Gender, Some(booth_id))?,
        school_level_stats: agg.group_by(GroupField::SchoolLevel, Some(booth_id))?,
    })
}

/// Validates and stores one guestbook entry. Nothing is written unless
/// every field passes.
pub fn submit_entry<S: EntryStore + ?Sized>(store: &mut S, ctx: &Context, req: &EntryRequest) -> Result<EntryCreated, ApiError> {
    let entry = validation::validate_entry(req, ctx.clock.now().naive_utc())?;

    let id = match store.insert_entry(&entry) {
        Ok(id) => id,
        Err(StoreError::ForeignKeyViolation) => return Err(ApiError::NotFound("booth")),
        Err(e) => return Err(e.into()),
    };

    log::info!("guestbook entry {} recorded at booth {}", id, entry.booth_id);
    Ok(EntryCreated {
        id,
        message: "방명록이 성공적으로 저장되었습니다.".to_string(),
    })
}

pub fn list_booths<S: EntryStore + ?Sized>(store: &mut S) -> Result<Vec<Booth>, ApiError> {
    Ok(store.list_booths()?)
}

pub fn create_booth<S: EntryStore + ?Sized>(
    store: &mut S,
    ctx: &Context,
    caller: &Caller,
    name: Option<&str>,
) -> Result<Booth, ApiError> {
    access::authorize_manage_booths(caller).into_result()?;
    let name = validation::validate_booth_name(name)?;

    match store.insert_booth(&name, ctx.clock.now().naive_utc()) {
        Ok(booth) => {
            log::info!("booth {} created as #{}", booth.name, booth.id);
            Ok(booth)
        }
        Err(StoreError::UniqueViolation) => Err(ApiError::DuplicateBooth),
        Err(e) => Err(e.into()),
    }
}

/// Booths that already collected entries cannot be deleted.
pub fn delete_booth<S: EntryStore + ?Sized>(store: &mut S, caller: &Caller, booth_id: i32) -> Result<(), ApiError> {
    access::authorize_manage_booths(caller).into_result()?;

    match store.delete_booth(booth_id) {
        Ok(true) => {
            log::info!("booth #{} deleted", booth_id);
            Ok(())
        }
        Ok(false) => Err(ApiError::NotFound("booth")),
        Err(StoreError::ForeignKeyViolation) => Err(ApiError::BoothInUse),
        Err(e) => Err(e.into()),
    }
}
