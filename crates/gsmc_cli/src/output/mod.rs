//! Output formatting module

mod text;

use gsmc_core::Report;

pub fn output_report(report: &Report, verbose: bool) {
    print!("{}", text::TextReport::new(report, verbose));
}
