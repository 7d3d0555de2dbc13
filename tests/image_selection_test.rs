//! Hash-based image selection across parts of a package.

mod common;

use std::collections::HashSet;

use blinder::{RedactionOptions, hash_asset, list_images, preview, redact};
use common::{DocxBuilder, PNG_A, PNG_B, drawing, paragraph, read_bytes, read_part, vml_picture};

fn two_images() -> Vec<u8> {
    DocxBuilder::new()
        .body(&drawing("rId5"))
        .body(&paragraph("caption"))
        .body(&vml_picture("rId6"))
        .image("rId5", "image1.png", PNG_A)
        .image("rId6", "image2.png", PNG_B)
        .build()
}

#[test]
fn test_list_images() {
    let images = list_images(&two_images()).unwrap();
    assert_eq!(images.len(), 2);
    assert_eq!(images[0].path, "word/media/image1.png");
    assert_eq!(images[0].hash, hash_asset(PNG_A));
    assert_eq!(images[0].media_type, "image/png");
    assert_eq!(images[1].hash, hash_asset(PNG_B));
}

#[test]
fn test_no_selection_removes_every_image() {
    let input = two_images();

    let preview = preview(&input, &[], None, &RedactionOptions::default()).unwrap();
    let result = &preview.result;

    assert_eq!(result.counters.images_removed, 2);
    assert_eq!(result.counters.assets_deleted, 2);
    assert_eq!(preview.statistics.images_removed, 2);
    assert!(preview.post.paragraphs.iter().all(|p| !p.has_image));
    assert_eq!(preview.post.paragraphs[1].text, "caption");

    assert!(read_bytes(&result.bytes, "word/media/image1.png").is_none());
    assert!(read_bytes(&result.bytes, "word/media/image2.png").is_none());
    let rels = read_part(&result.bytes, "word/_rels/document.xml.rels").unwrap();
    assert!(!rels.contains("media/"));
    let document = read_part(&result.bytes, "word/document.xml").unwrap();
    assert!(!document.contains("w:drawing"));
    assert!(!document.contains("w:pict"));
}

#[test]
fn test_empty_selection_means_all() {
    let input = two_images();
    let empty = HashSet::new();

    let result = redact(&input, &[], Some(&empty), &RedactionOptions::default()).unwrap();

    assert_eq!(result.counters.images_removed, 2);
    assert!(list_images(&result.bytes).unwrap().is_empty());
}

#[test]
fn test_selection_removes_only_matching_assets() {
    let input = two_images();
    let selection: HashSet<_> = [hash_asset(PNG_B)].into_iter().collect();

    let result = redact(&input, &[], Some(&selection), &RedactionOptions::default()).unwrap();

    assert_eq!(result.counters.images_removed, 1);
    assert_eq!(result.counters.assets_deleted, 1);
    assert_eq!(
        read_bytes(&result.bytes, "word/media/image1.png").as_deref(),
        Some(PNG_A)
    );
    assert!(read_bytes(&result.bytes, "word/media/image2.png").is_none());

    let document = read_part(&result.bytes, "word/document.xml").unwrap();
    assert!(document.contains(r#"r:embed="rId5""#));
    assert!(!document.contains("rId6"));
    let rels = read_part(&result.bytes, "word/_rels/document.xml.rels").unwrap();
    assert!(rels.contains(r#"Id="rId5""#));
    assert!(!rels.contains(r#"Id="rId6""#));
}

#[test]
fn test_shared_asset_removed_from_every_part() {
    let input = DocxBuilder::new()
        .body(&drawing("rId5"))
        .body(&paragraph("body text"))
        .image("rId5", "logo.png", PNG_A)
        .header("rIdH1", "header1.xml", &drawing("rId1"), &[("rId1", "logo.png")])
        .build();
    let selection: HashSet<_> = [hash_asset(PNG_A)].into_iter().collect();

    let result = redact(&input, &[], Some(&selection), &RedactionOptions::default()).unwrap();

    assert_eq!(result.counters.images_removed, 2);
    assert_eq!(result.counters.assets_deleted, 1);
    assert!(read_bytes(&result.bytes, "word/media/logo.png").is_none());

    let header = read_part(&result.bytes, "word/header1.xml").unwrap();
    assert!(!header.contains("a:blip"));
    let header_rels = read_part(&result.bytes, "word/_rels/header1.xml.rels").unwrap();
    assert!(!header_rels.contains("logo.png"));
    let rels = read_part(&result.bytes, "word/_rels/document.xml.rels").unwrap();
    assert!(!rels.contains("logo.png"));
    assert!(rels.contains("header1.xml"));
}

#[test]
fn test_unmatched_selection_keeps_images() {
    let input = DocxBuilder::new()
        .body(&drawing("rId5"))
        .image("rId5", "logo.png", PNG_A)
        .header("rIdH1", "header1.xml", &drawing("rId1"), &[("rId1", "logo.png")])
        .build();
    let selection: HashSet<_> = [hash_asset(PNG_B)].into_iter().collect();

    let result = redact(&input, &[], Some(&selection), &RedactionOptions::default()).unwrap();

    assert_eq!(result.counters.images_removed, 0);
    assert_eq!(result.counters.assets_deleted, 0);
    assert_eq!(
        read_bytes(&result.bytes, "word/media/logo.png").as_deref(),
        Some(PNG_A)
    );
    let header = read_part(&result.bytes, "word/header1.xml").unwrap();
    assert!(header.contains("a:blip"));
}

#[test]
fn test_images_kept_when_disabled() {
    let input = two_images();
    let options = RedactionOptions {
        strip_images: false,
        ..RedactionOptions::default()
    };

    let result = redact(&input, &[], None, &options).unwrap();

    assert_eq!(result.counters.images_removed, 0);
    assert_eq!(list_images(&result.bytes).unwrap().len(), 2);
    let document = read_part(&result.bytes, "word/document.xml").unwrap();
    assert!(document.contains("w:drawing"));
}
