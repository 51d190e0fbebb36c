//! Spatial-tabular join.
//!
//! Copies attribute values from tabular records into the spatial regions
//! sharing the same LABEL key. Exact, case-sensitive string match; both
//! sets are small so the full scan is fine.

use tracing::debug;

use crate::load::{Record, Region};

/// Join every record's attribute values into every region with a matching
/// label. Records are walked in order, so duplicate keys resolve to the
/// last record seen. Unmatched records are ignored; unmatched regions keep
/// no values and later classify as no-data.
pub fn join_records(regions: &mut [Region], records: &[Record], attributes: &[String]) {
    let mut matched = 0usize;
    for record in records {
        for region in regions.iter_mut().filter(|r| r.label == record.label) {
            for attribute in attributes {
                region
                    .values
                    .insert(attribute.clone(), record.value(attribute));
            }
            matched += 1;
        }
    }
    debug!(
        records = records.len(),
        regions = regions.len(),
        matched,
        "Joined tabular records onto regions"
    );
}

/// Join misses in both directions, for diagnostics.
pub struct JoinReport {
    pub unmatched_records: Vec<String>,
    pub unmatched_regions: Vec<String>,
}

pub fn join_report(regions: &[Region], records: &[Record]) -> JoinReport {
    let unmatched_records = records
        .iter()
        .filter(|rec| !regions.iter().any(|reg| reg.label == rec.label))
        .map(|rec| rec.label.clone())
        .collect();
    let unmatched_regions = regions
        .iter()
        .filter(|reg| !records.iter().any(|rec| rec.label == reg.label))
        .map(|reg| reg.label.clone())
        .collect();
    JoinReport {
        unmatched_records,
        unmatched_regions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};
    use std::collections::HashMap;

    fn square() -> MultiPolygon<f64> {
        polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 1.0),
        ]
        .into()
    }

    fn record(label: &str, pairs: &[(&str, &str)]) -> Record {
        let fields: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Record {
            label: label.to_string(),
            fields,
        }
    }

    #[test]
    fn matching_key_copies_parsed_values() {
        let mut regions = vec![
            Region::new("Denver", square()),
            Region::new("Boulder", square()),
        ];
        let records = vec![record("Denver", &[("Employment", "123.4")])];
        let attributes = vec!["Employment".to_string()];

        join_records(&mut regions, &records, &attributes);

        assert_eq!(regions[0].value("Employment"), 123.4);
        // Boulder had no matching record: still no-data.
        assert!(regions[1].value("Employment").is_nan());
    }

    #[test]
    fn duplicate_keys_last_write_wins() {
        let mut regions = vec![Region::new("Denver", square())];
        let records = vec![
            record("Denver", &[("Employment", "1")]),
            record("Denver", &[("Employment", "2")]),
        ];
        join_records(&mut regions, &records, &["Employment".to_string()]);
        assert_eq!(regions[0].value("Employment"), 2.0);
    }

    #[test]
    fn unparseable_field_joins_as_nan() {
        let mut regions = vec![Region::new("Denver", square())];
        let records = vec![record("Denver", &[("Employment", "N/A")])];
        join_records(&mut regions, &records, &["Employment".to_string()]);
        assert!(regions[0].values.contains_key("Employment"));
        assert!(regions[0].value("Employment").is_nan());
    }

    #[test]
    fn report_lists_misses_both_ways() {
        let regions = vec![
            Region::new("Denver", square()),
            Region::new("Boulder", square()),
        ];
        let records = vec![record("Denver", &[]), record("Pueblo", &[])];
        let report = join_report(&regions, &records);
        assert_eq!(report.unmatched_records, vec!["Pueblo"]);
        assert_eq!(report.unmatched_regions, vec!["Boulder"]);
    }
}
