//! Unit tests for the statistics, access and guestbook operations.

#![allow(clippy::unwrap_used)]

mod helpers;
