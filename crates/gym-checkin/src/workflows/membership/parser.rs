use serde::Deserialize;
use serde_json::{Deserializer, Value};
use tracing::{info, warn};

use super::domain::MemberRecord;

/// Why a member list body could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum MemberListError {
    #[error("member list body is empty")]
    Empty,
    #[error("member list is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),
}

/// Decodes the body of `GET /api/socios/`.
///
/// The API sometimes answers with objects glued together (`{...}{...}`), optionally separated
/// by commas, instead of an array. Those bodies decode to the same records the array form
/// would produce. Rows that cannot be read as a member are skipped, unless none can.
pub fn parse_member_list(body: &str) -> Result<Vec<MemberRecord>, MemberListError> {
    let rows = parse_rows(body)?;
    let total = rows.len();

    let mut records = Vec::with_capacity(total);
    let mut first_error = None;
    for (index, row) in rows.into_iter().enumerate() {
        match MemberRecord::deserialize(row) {
            Ok(record) => records.push(record),
            Err(error) => {
                warn!(index, %error, "skipping unreadable member row");
                if first_error.is_none() {
                    first_error = Some(error);
                }
            }
        }
    }

    match first_error {
        Some(error) if records.is_empty() => Err(MemberListError::Malformed(error)),
        _ => {
            if records.len() < total {
                info!(kept = records.len(), total, "member list decoded with skipped rows");
            }
            Ok(records)
        }
    }
}

fn parse_rows(body: &str) -> Result<Vec<Value>, MemberListError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(MemberListError::Empty);
    }

    let array_error = match serde_json::from_str::<Vec<Value>>(trimmed) {
        Ok(rows) => return Ok(rows),
        Err(err) => err,
    };

    if trimmed.starts_with('[') {
        return Err(MemberListError::Malformed(array_error));
    }

    warn!(error = %array_error, "member list is not a JSON array, attempting repair");

    let rows = concatenated_values(trimmed).map_err(MemberListError::Malformed)?;
    info!(rows = rows.len(), "member list repaired");
    Ok(rows)
}

/// Reads back-to-back JSON values, allowing one comma between neighbours.
fn concatenated_values(body: &str) -> Result<Vec<Value>, serde_json::Error> {
    let mut rows = Vec::new();
    let mut rest = body;

    loop {
        let mut stream = Deserializer::from_str(rest).into_iter::<Value>();
        match stream.next() {
            Some(row) => rows.push(row?),
            None => return Ok(rows),
        }

        rest = rest[stream.byte_offset()..].trim_start();
        if let Some(after_comma) = rest.strip_prefix(',') {
            rest = after_comma;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::membership::domain::MemberId;

    fn dnis(records: &[MemberRecord]) -> Vec<&str> {
        records.iter().map(|record| record.dni.as_str()).collect()
    }

    #[test]
    fn parses_well_formed_array() {
        let records = parse_member_list(r#"[{"dni":"1"},{"dni":"2"}]"#).expect("array parses");
        assert_eq!(dnis(&records), vec!["1", "2"]);
    }

    #[test]
    fn concatenated_objects_match_array_form() {
        let glued = parse_member_list(r#"{"dni":"1"}{"dni":"2"}"#).expect("repaired");
        let array = parse_member_list(r#"[{"dni":"1"},{"dni":"2"}]"#).expect("array parses");
        assert_eq!(glued, array);
    }

    #[test]
    fn repairs_nested_objects_and_whitespace() {
        let body = r#"
            {"dni":"1","id":4,"tipo_mensualidad":{"tipo":"12 clases"},"clases_restantes":3}
            {"dni":"2","id":5,"tipo_mensualidad":{"tipo":"Pase Libre"}}
        "#;
        let records = parse_member_list(body).expect("repaired");
        assert_eq!(dnis(&records), vec!["1", "2"]);
        assert_eq!(records[0].remaining_classes(), Some(3));
    }

    #[test]
    fn braces_inside_strings_survive_repair() {
        let records =
            parse_member_list(r#"{"dni":"1","nombre":"}{"}{"dni":"2"}"#).expect("repaired");
        assert_eq!(records[0].first_name.as_deref(), Some("}{"));
        assert_eq!(records[1].dni, MemberId("2".to_string()));
    }

    #[test]
    fn repairs_comma_separated_objects() {
        let records = parse_member_list(r#"{"dni":"1"},{"dni":"2"}"#).expect("repaired");
        assert_eq!(dnis(&records), vec!["1", "2"]);
    }

    #[test]
    fn repairs_mixed_glued_and_comma_separated_objects() {
        let records =
            parse_member_list(r#"{"dni":"1"}{"dni":"2"}, {"dni":"3"},"#).expect("repaired");
        assert_eq!(dnis(&records), vec!["1", "2", "3"]);
    }

    #[test]
    fn unreadable_row_does_not_hide_the_others() {
        let records = parse_member_list(
            r#"[{"dni":"1","fecha_vencimiento":""},{"nombre":"sin dni"},{"dni":2,"fecha_vencimiento":"2025-04-30T00:00:00Z"}]"#,
        )
        .expect("readable rows survive");
        assert_eq!(dnis(&records), vec!["1", "2"]);
        assert_eq!(records[0].expires_on(), None);
    }

    #[test]
    fn single_object_becomes_one_record() {
        let records = parse_member_list(r#"{"dni":"9"}"#).expect("single object");
        assert_eq!(dnis(&records), vec!["9"]);
    }

    #[test]
    fn rejects_unrepairable_bodies() {
        assert!(matches!(
            parse_member_list("   "),
            Err(MemberListError::Empty)
        ));
        assert!(matches!(
            parse_member_list("<html>Bad Gateway</html>"),
            Err(MemberListError::Malformed(_))
        ));
        assert!(matches!(
            parse_member_list(r#"[{"dni":"1"},"#),
            Err(MemberListError::Malformed(_))
        ));
        assert!(matches!(
            parse_member_list(r#"{"nombre":"sin dni"}"#),
            Err(MemberListError::Malformed(_))
        ));
        assert!(matches!(
            parse_member_list(r#"{"dni":"1"},,{"dni":"2"}"#),
            Err(MemberListError::Malformed(_))
        ));
    }
}
