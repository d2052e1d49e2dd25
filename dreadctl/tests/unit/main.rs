//! Integration tests against a mock deployment service

mod test_deploy;
mod test_revisions;
mod test_run;
