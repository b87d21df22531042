use busgate_common::signature::split;
use busgate_common::Error;

#[test]
fn splits_basic_and_container_codes() {
    assert_eq!(split("aia{sv}").unwrap(), vec!["ai", "a{sv}"]);
    assert_eq!(split("sbd").unwrap(), vec!["s", "b", "d"]);
    assert_eq!(split("a(ii)v").unwrap(), vec!["a(ii)", "v"]);
    assert_eq!(split("aai").unwrap(), vec!["aai"]);
    assert_eq!(split("a{oa{sa{sv}}}").unwrap(), vec!["a{oa{sa{sv}}}"]);
}

#[test]
fn empty_signature_yields_no_codes() {
    assert!(split("").unwrap().is_empty());
}

#[test]
fn concatenated_codes_rebuild_the_signature() {
    for signature in ["aia{sv}", "a{oa{sa{sv}}}", "(so)ax", "ybnqiuxtdsogv"] {
        assert_eq!(split(signature).unwrap().concat(), signature);
    }
}

#[test]
fn rejects_malformed_signatures() {
    assert!(matches!(split("a"), Err(Error::InvalidSignature(_))));
    assert!(matches!(split("ia"), Err(Error::InvalidSignature(_))));
    assert!(matches!(split("(ii"), Err(Error::InvalidSignature(_))));
    assert!(matches!(split("ii)"), Err(Error::InvalidSignature(_))));
    assert!(matches!(split("a{sv"), Err(Error::InvalidSignature(_))));
    assert!(matches!(split("sz"), Err(Error::InvalidSignature(_))));
}
