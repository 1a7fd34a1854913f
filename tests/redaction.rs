//! Stream-level redaction tests, including property-based coverage of the
//! "no registered value ever reaches the output" guarantee.

use std::io::Write;

use envault::{MaskedValues, MaskingWriter, MASK};
use proptest::prelude::*;

fn mask_all(masked: &MaskedValues, input: &str) -> String {
    let mut sink = Vec::new();
    let mut writer = MaskingWriter::new(&mut sink, masked.clone());
    writer.write_all(input.as_bytes()).unwrap();
    writer.flush().unwrap();
    String::from_utf8(sink).unwrap()
}

#[test]
fn deploy_log_is_scrubbed_line_by_line() {
    let masked = MaskedValues::new();
    masked.insert("s3cr3t");
    masked.insert("tok-9f81");

    let mut sink = Vec::new();
    let mut writer = MaskingWriter::new(&mut sink, masked.clone());
    writer.write_all(b"authenticating with tok-9f81\n").unwrap();
    writer.write_all(b"db password is s3cr3t, retrying with s3cr3t\n").unwrap();
    masked.insert("late-entry");
    writer.write_all(b"rotated to late-entry\n").unwrap();

    let output = String::from_utf8(sink).unwrap();
    assert_eq!(
        output,
        "authenticating with ****\ndb password is ****, retrying with ****\nrotated to ****\n"
    );
}

#[test]
fn adjacent_occurrences_each_get_their_own_marker() {
    let masked = MaskedValues::new();
    masked.insert("s3cr3t");

    assert_eq!(mask_all(&masked, "s3cr3ts3cr3t"), "********");
}

#[test]
fn write_reports_input_length_not_masked_length() {
    let masked = MaskedValues::new();
    masked.insert("s3cr3t");

    let mut sink = Vec::new();
    let mut writer = MaskingWriter::new(&mut sink, masked);
    let written = writer.write(b"s3cr3t").unwrap();

    assert_eq!(written, 6);
    assert_eq!(sink, MASK.as_bytes());
}

#[test]
fn value_split_across_writes_escapes_masking() {
    // Documented limitation: matching is per write call, so a value broken
    // across two writes passes through. Hosts that buffer output line-wise
    // do not hit this.
    let masked = MaskedValues::new();
    masked.insert("s3cr3t");

    let mut sink = Vec::new();
    let mut writer = MaskingWriter::new(&mut sink, masked);
    writer.write_all(b"prefix s3c").unwrap();
    writer.write_all(b"r3t suffix").unwrap();

    let output = String::from_utf8(sink).unwrap();
    assert_eq!(output, "prefix s3cr3t suffix");
}

proptest! {
    #[test]
    fn output_never_contains_a_registered_value(
        secrets in prop::collection::hash_set("[a-z0-9]{3,12}", 1..5),
        fragments in prop::collection::vec("[A-Z ,.]{0,16}", 1..8),
    ) {
        let masked = MaskedValues::new();
        for secret in &secrets {
            masked.insert(secret);
        }

        // Interleave plain fragments with secret values to build the input.
        let secret_list: Vec<&String> = secrets.iter().collect();
        let mut input = String::new();
        for (i, fragment) in fragments.iter().enumerate() {
            input.push_str(fragment);
            input.push_str(secret_list[i % secret_list.len()]);
        }

        let output = mask_all(&masked, &input);

        for secret in &secrets {
            prop_assert!(
                !output.contains(secret.as_str()),
                "registered value leaked into output"
            );
        }
        prop_assert!(output.contains(MASK));
    }

    #[test]
    fn clean_input_passes_through_unchanged(
        secrets in prop::collection::hash_set("[a-z0-9]{3,12}", 1..5),
        input in "[A-Z !?]{0,64}",
    ) {
        let masked = MaskedValues::new();
        for secret in &secrets {
            masked.insert(secret);
        }

        // Disjoint alphabets and case-sensitive matching: nothing can match.
        prop_assert_eq!(mask_all(&masked, &input), input);
    }
}
