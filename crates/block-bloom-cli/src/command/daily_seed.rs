use block_bloom_engine::daily_seed;
use chrono::{Local, NaiveDate};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct DailySeedArg {
    /// Date to compute the seed for (YYYY-MM-DD), today if omitted
    date: Option<NaiveDate>,
}

pub(crate) fn run(arg: &DailySeedArg) {
    let date = arg.date.unwrap_or_else(|| Local::now().date_naive());
    println!("{}", daily_seed(date));
}
