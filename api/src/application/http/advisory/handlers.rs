pub mod get_daily_advisory;
