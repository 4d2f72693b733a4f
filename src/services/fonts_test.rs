use super::*;
use uuid::Uuid;

#[test]
fn stem_with_style_maps_weight() {
    assert_eq!(parse_face_stem("Inter-Bold"), ("Inter".to_owned(), 700));
    assert_eq!(parse_face_stem("Playfair-Display-SemiBold"), ("Playfair-Display".to_owned(), 600));
}

#[test]
fn stem_without_style_is_regular() {
    assert_eq!(parse_face_stem("Lobster"), ("Lobster".to_owned(), 400));
    assert_eq!(parse_face_stem("-Bold"), ("-Bold".to_owned(), 400));
}

#[test]
fn missing_directory_yields_empty_book() {
    let dir = std::env::temp_dir().join(format!("photolayers-no-fonts-{}", Uuid::new_v4()));
    assert!(load_font_dir(&dir).is_empty());
}

#[test]
fn invalid_and_foreign_files_are_skipped() {
    let dir = std::env::temp_dir().join(format!("photolayers-fonts-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("Broken-Bold.ttf"), b"not a font").unwrap();
    std::fs::write(dir.join("readme.txt"), b"hello").unwrap();

    assert!(load_font_dir(&dir).is_empty());
    std::fs::remove_dir_all(dir).unwrap();
}
