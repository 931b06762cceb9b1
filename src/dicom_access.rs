use dicom::core::Tag;
use dicom::dictionary_std::StandardDataDictionary;
use dicom::object::{DefaultDicomObject, InMemDicomObject};

/// Item type of every sequence read from a structure set.
pub type Item = InMemDicomObject<StandardDataDictionary>;

/// Small helper trait to pull values from the file object and from sequence items alike.
pub trait ElementAccess {
    fn element_str(&self, tag: Tag) -> Option<String>;
    fn sequence_items(&self, tag: Tag) -> &[Item];
}

impl ElementAccess for DefaultDicomObject {
    fn element_str(&self, tag: Tag) -> Option<String> {
        (**self).element_str(tag)
    }

    fn sequence_items(&self, tag: Tag) -> &[Item] {
        (**self).sequence_items(tag)
    }
}

impl ElementAccess for Item {
    fn element_str(&self, tag: Tag) -> Option<String> {
        // Strip the space padding DICOM adds to odd-length strings.
        self.element(tag)
            .ok()
            .and_then(|e| e.to_str().ok())
            .map(|s| s.trim().to_string())
    }

    fn sequence_items(&self, tag: Tag) -> &[Item] {
        self.element(tag)
            .ok()
            .and_then(|e| e.items())
            .unwrap_or(&[])
    }
}
