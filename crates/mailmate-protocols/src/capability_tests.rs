use super::*;

#[test]
fn test_capability_name_wire_names() {
    assert_eq!(CapabilityName::LanguageModel.as_str(), "languageModel");
    assert_eq!(CapabilityName::LanguageDetector.to_string(), "languageDetector");
    let json = serde_json::to_string(&CapabilityName::Rewriter).unwrap();
    assert_eq!(json, "\"rewriter\"");
}

#[test]
fn test_capability_name_from_str() {
    assert_eq!(
        "translator".parse::<CapabilityName>().unwrap(),
        CapabilityName::Translator
    );
    assert!("teleporter".parse::<CapabilityName>().is_err());
}

#[test]
fn test_unavailable_map_has_all_keys() {
    let map = CapabilityMap::unavailable();
    assert_eq!(map.iter().count(), 6);
    assert!(!map.any_available());
    assert!(map.available().is_empty());
}

#[test]
fn test_map_with_available() {
    let map = CapabilityMap::with_available(&[CapabilityName::Writer]);
    assert!(map.get(CapabilityName::Writer));
    assert!(!map.get(CapabilityName::Summarizer));
    assert!(map.any_available());
    assert_eq!(map.available(), vec![CapabilityName::Writer]);
}

#[test]
fn test_map_serializes_camel_case_keys() {
    let map = CapabilityMap::with_available(&[CapabilityName::LanguageDetector]);
    let value = serde_json::to_value(&map).unwrap();
    assert_eq!(value["languageDetector"], true);
    assert_eq!(value["languageModel"], false);
    assert_eq!(value.as_object().unwrap().len(), 6);

    let back: CapabilityMap = serde_json::from_value(value).unwrap();
    assert_eq!(back, map);
}

#[test]
fn test_options_skip_unset_fields() {
    let options = CapabilityOptions::new()
        .with_languages("es", "en")
        .with_preserve_formatting(true);
    let value = serde_json::to_value(&options).unwrap();
    assert_eq!(value["sourceLanguage"], "es");
    assert_eq!(value["targetLanguage"], "en");
    assert!(value.get("maxTokens").is_none());
}

#[test]
fn test_summary_type_renamed() {
    let options = CapabilityOptions::new().with_summary("key-points", "markdown", "short");
    let value = serde_json::to_value(&options).unwrap();
    assert_eq!(value["type"], "key-points");
}

#[test]
fn test_detection_confidence_clamped() {
    assert_eq!(DetectionResult::new("es", 1.4).confidence, 1.0);
    assert_eq!(DetectionResult::new("es", -0.2).confidence, 0.0);
}

#[test]
fn test_output_detections_sorted() {
    let output = CapabilityOutput::Detections(vec![
        DetectionResult::new("fr", 0.1),
        DetectionResult::new("es", 0.92),
    ]);
    let results = output.into_detections().unwrap();
    assert_eq!(results[0].detected_language, "es");
}

#[test]
fn test_output_kind_mismatch() {
    assert!(CapabilityOutput::Text("hi".into()).into_detections().is_err());
    assert!(CapabilityOutput::Detections(vec![]).into_text().is_err());
}
