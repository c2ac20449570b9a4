/// Property-based tests using proptest
/// Tests invariants of fault classification and envelope writing for all inputs
use proptest::prelude::*;
use subscription_lookup::config::Credentials;
use subscription_lookup::models::{LookupRequest, NO_SUBSCRIPTIONS_FOUND};
use subscription_lookup::soap::{build_envelope, fault_code, parse_response, SoapResponse};

fn fault_envelope(message: &str) -> String {
    format!(
        "<s:Envelope xmlns:s=\"http://schemas.xmlsoap.org/soap/envelope/\"><s:Body><s:Fault>\
         <faultcode>s:Server</faultcode><faultstring>{}</faultstring></s:Fault></s:Body></s:Envelope>",
        message
    )
}

// Property: fault classification only looks at the text before the first colon
proptest! {
    #[test]
    fn fault_code_never_panics(message in "\\PC*") {
        let _ = fault_code(&message);
    }

    #[test]
    fn not_found_sentinel_survives_any_suffix(suffix in "[ -~]{0,40}") {
        let message = format!("{}:{}", NO_SUBSCRIPTIONS_FOUND, suffix);
        prop_assert_eq!(fault_code(&message), NO_SUBSCRIPTIONS_FOUND);
    }

    #[test]
    fn fault_code_has_no_colon(message in "[ -~]{0,60}") {
        prop_assert!(!fault_code(&message).contains(':'));
    }

    #[test]
    fn parsed_fault_keeps_message(suffix in "[a-zA-Z0-9 .,-]{0,40}") {
        let message = format!("{}: {}", NO_SUBSCRIPTIONS_FOUND, suffix);
        match parse_response(&fault_envelope(&message)) {
            Ok(SoapResponse::Fault(fault)) => {
                prop_assert_eq!(fault.code(), NO_SUBSCRIPTIONS_FOUND);
            }
            other => prop_assert!(false, "expected fault, got {:?}", other),
        }
    }
}

// Property: any caller input yields a well-formed envelope that reads back cleanly
proptest! {
    #[test]
    fn envelope_escapes_arbitrary_input(
        email in "[^\\x00-\\x1f]{1,30}",
        zip in "[^\\x00-\\x1f]{1,10}"
    ) {
        prop_assume!(!email.trim().is_empty() && !zip.trim().is_empty());

        let credentials = Credentials::new("user", "pa<ss>&\"'", "1");
        let request = LookupRequest::by_email(&email, &zip, None).unwrap();
        let xml = build_envelope("urn:test", &credentials, &request).unwrap();

        // Requests carry no Fault and no records, so they read back as an empty result.
        prop_assert_eq!(parse_response(&xml).unwrap(), SoapResponse::Subscriptions(vec![]));
        prop_assert!(!xml.contains("customerIdStr"));
    }

    #[test]
    fn customer_number_envelope_never_sends_email_fields(number in "[0-9-]{1,20}") {
        let credentials = Credentials::new("user", "pass", "1");
        let request = LookupRequest::by_customer_number(&number, None).unwrap();
        let xml = build_envelope("urn:test", &credentials, &request).unwrap();

        prop_assert!(!xml.contains("eMail"));
        prop_assert!(!xml.contains("zipCode"));
        let expected = format!("<customerIdStr>{}</customerIdStr>", number);
        prop_assert!(xml.contains(&expected));
    }
}
