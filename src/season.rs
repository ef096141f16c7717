use crate::error::{PipelineError, Result};

pub fn season_label(start_year: i32) -> String {
    format!("{start_year}-{:02}", (start_year + 1).rem_euclid(100))
}

pub fn parse_season_label(label: &str) -> Result<i32> {
    let invalid = || PipelineError::InvalidSeason(label.to_string());
    let (start, end) = label.trim().split_once('-').ok_or_else(invalid)?;
    if start.len() != 4 || end.len() != 2 {
        return Err(invalid());
    }
    let start_year = start.parse::<i32>().map_err(|_| invalid())?;
    let end_year = end.parse::<i32>().map_err(|_| invalid())?;
    if (start_year + 1).rem_euclid(100) != end_year {
        return Err(invalid());
    }
    Ok(start_year)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonRange {
    pub start: i32,
    pub end: i32,
}

impl SeasonRange {
    pub fn new(start: i32, end: i32) -> Result<Self> {
        if start > end {
            return Err(PipelineError::InvalidConfig(format!(
                "start season {start} is after end season {end}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn years(&self) -> impl Iterator<Item = i32> {
        self.start..=self.end
    }

    pub fn labels(&self) -> Vec<String> {
        self.years().map(season_label).collect()
    }

    pub fn first_label(&self) -> String {
        season_label(self.start)
    }

    pub fn last_label(&self) -> String {
        season_label(self.end)
    }

    pub fn contains_label(&self, label: &str) -> bool {
        parse_season_label(label).is_ok_and(|year| year >= self.start && year <= self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_use_two_digit_end_year() {
        assert_eq!(season_label(2003), "2003-04");
        assert_eq!(season_label(1999), "1999-00");
        assert_eq!(season_label(2009), "2009-10");
    }

    #[test]
    fn parse_rejects_malformed_labels() {
        assert_eq!(parse_season_label("1999-00").unwrap(), 1999);
        assert!(parse_season_label("2003-05").is_err());
        assert!(parse_season_label("2003").is_err());
        assert!(parse_season_label("03-04").is_err());
    }

    #[test]
    fn range_is_inclusive() {
        let range = SeasonRange::new(2010, 2012).unwrap();
        assert_eq!(range.labels(), vec!["2010-11", "2011-12", "2012-13"]);
        assert!(range.contains_label("2012-13"));
        assert!(!range.contains_label("2013-14"));
        assert!(!range.contains_label("garbage"));
        assert!(SeasonRange::new(2013, 2012).is_err());
    }
}
