//! File upload field.

use horizon_trellis_core::{
    ErrorKind, Field, FieldBase, FileItem, HtmlStringBuffer, Request, TrellisResult,
};

use super::{impl_field_control, record_error, render_common_attributes};

/// A file upload input.
///
/// Binds the [`FileItem`] the multipart collaborator stored on the request.
/// A required field needs a non-empty upload.
#[derive(Debug, Clone)]
pub struct FileField {
    field: FieldBase,
    file: Option<FileItem>,
}

impl FileField {
    /// Create a file field.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            field: FieldBase::new(name),
            file: None,
        }
    }

    /// Mark the field required (builder pattern).
    pub fn required(mut self) -> Self {
        self.field.set_required(true);
        self
    }

    /// The uploaded file.
    pub fn file(&self) -> Option<&FileItem> {
        self.file.as_ref()
    }

    fn render_field(&self, buffer: &mut HtmlStringBuffer) -> TrellisResult<()> {
        buffer.element_start("input").append_attribute("type", "file");
        render_common_attributes(buffer, &self.field, "FileField")?;
        buffer.element_end();
        Ok(())
    }
}

impl Field for FileField {
    fn field(&self) -> &FieldBase {
        &self.field
    }

    fn field_mut(&mut self) -> &mut FieldBase {
        &mut self.field
    }

    fn bind_request_value(&mut self, request: &Request) {
        self.file = request.file_item(self.field.name()).cloned();
        let file_name = self
            .file
            .as_ref()
            .map(|f| f.file_name.clone())
            .unwrap_or_default();
        self.field.set_value(file_name);
    }

    fn validate(&mut self) {
        self.field.clear_error();
        let uploaded = self.file.as_ref().is_some_and(|f| f.size() > 0);
        if self.field.is_required() && !uploaded {
            record_error(&mut self.field, ErrorKind::Required, &[]);
        }
    }
}

impl_field_control!(FileField);

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_trellis_core::{MultipartParser, UploadError, UploadLimits};

    struct Fixed(Vec<u8>);

    impl MultipartParser for Fixed {
        fn parse(&self, _: &Request, _: &UploadLimits) -> Result<Vec<FileItem>, UploadError> {
            Ok(vec![FileItem {
                field_name: "report".into(),
                file_name: "q1.pdf".into(),
                content_type: "application/pdf".into(),
                data: self.0.clone(),
            }])
        }
    }

    #[test]
    fn test_required_upload() {
        let mut request = Request::post("/upload.htm");
        request.apply_multipart(&Fixed(vec![1, 2]), &UploadLimits::default());

        let mut field = FileField::new("report").required();
        field.bind_request_value(&request);
        field.validate();
        assert!(field.is_valid());
        assert_eq!(field.value(), "q1.pdf");
        assert_eq!(field.file().map(FileItem::size), Some(2));
    }

    #[test]
    fn test_empty_upload_is_missing() {
        let mut request = Request::post("/upload.htm");
        request.apply_multipart(&Fixed(Vec::new()), &UploadLimits::default());

        let mut field = FileField::new("report").required();
        field.bind_request_value(&request);
        field.validate();
        assert_eq!(field.error().map(|e| e.kind), Some(ErrorKind::Required));
    }
}
