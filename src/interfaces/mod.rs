pub mod csv_interface;
pub mod html_interface;

use chrono::Utc;

/// Output filename with the run timestamp, e.g. `mail_flow_20260823_141502.csv`.
pub fn timestamped_filename(stem: &str, extension: &str) -> String {
    format!("{}_{}.{}", stem, Utc::now().format("%Y%m%d_%H%M%S"), extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamped_filename_shape() {
        let name = timestamped_filename("mail_flow", "csv");
        assert!(name.starts_with("mail_flow_"));
        assert!(name.ends_with(".csv"));
        // stem + '_' + yyyyMMdd + '_' + HHmmss + ".csv"
        assert_eq!(name.len(), "mail_flow_".len() + 15 + ".csv".len());
    }
}
