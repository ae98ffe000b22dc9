//! Loading the pre-printed form and stamping overlay pages onto it.

use std::path::PathBuf;

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use crate::error::RenderError;

/// Where template bytes come from.
pub trait TemplateSource {
    /// Human-readable origin for log lines.
    fn describe(&self) -> String;
    fn load(&self) -> Result<Vec<u8>, RenderError>;
}

/// A template file on disk, with an optional URL fetched when the file
/// can't be read.
#[derive(Debug, Clone)]
pub struct LocalOrRemoteTemplate {
    pub path: PathBuf,
    pub fallback_url: Option<String>,
}

impl LocalOrRemoteTemplate {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            fallback_url: None,
        }
    }

    pub fn with_fallback_url(mut self, url: impl Into<String>) -> Self {
        self.fallback_url = Some(url.into());
        self
    }

    fn fetch(url: &str) -> Result<Vec<u8>, reqwest::Error> {
        let response = reqwest::blocking::get(url)?.error_for_status()?;
        Ok(response.bytes()?.to_vec())
    }
}

impl TemplateSource for LocalOrRemoteTemplate {
    fn describe(&self) -> String {
        match &self.fallback_url {
            Some(url) => format!("{} (fallback {})", self.path.display(), url),
            None => self.path.display().to_string(),
        }
    }

    fn load(&self) -> Result<Vec<u8>, RenderError> {
        let local_err = match std::fs::read(&self.path) {
            Ok(bytes) => return Ok(bytes),
            Err(e) => e,
        };
        let Some(url) = &self.fallback_url else {
            return Err(RenderError::TemplateUnavailable(format!(
                "{}: {}",
                self.path.display(),
                local_err
            )));
        };
        log::info!(
            "template {} not readable ({}), fetching {}",
            self.path.display(),
            local_err,
            url
        );
        Self::fetch(url).map_err(|e| {
            RenderError::TemplateUnavailable(format!(
                "{}: {}; {}: {}",
                self.path.display(),
                local_err,
                url,
                e
            ))
        })
    }
}

/// Template bytes already in memory.
#[derive(Debug, Clone)]
pub struct InMemoryTemplate(pub Vec<u8>);

impl TemplateSource for InMemoryTemplate {
    fn describe(&self) -> String {
        format!("in-memory template ({} bytes)", self.0.len())
    }

    fn load(&self) -> Result<Vec<u8>, RenderError> {
        if self.0.is_empty() {
            return Err(RenderError::TemplateUnavailable("empty template".to_string()));
        }
        Ok(self.0.clone())
    }
}

/// A parsed template PDF.
pub struct TemplateDocument {
    doc: Document,
    page_ids: Vec<ObjectId>,
    page_size: (f64, f64),
}

impl TemplateDocument {
    pub fn parse(bytes: &[u8]) -> Result<Self, RenderError> {
        let doc = Document::load_mem(bytes)
            .map_err(|e| RenderError::Template(format!("cannot parse template: {e}")))?;
        if doc.is_encrypted() {
            return Err(RenderError::Template("template PDF is encrypted".to_string()));
        }
        let page_ids: Vec<ObjectId> = doc.get_pages().values().copied().collect();
        let Some(first) = page_ids.first() else {
            return Err(RenderError::Template("template has no pages".to_string()));
        };
        let page_size = media_box_size(&doc, *first)?;
        Ok(Self {
            doc,
            page_ids,
            page_size,
        })
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Width and height of the first page in points.
    pub fn page_size(&self) -> (f64, f64) {
        self.page_size
    }

    /// Draw overlay page `i` on top of template page `i`. The template's own
    /// content is left untouched; each overlay page becomes a Form XObject
    /// invoked after it.
    pub fn stamp(self, overlay_pdf: &[u8]) -> Result<Vec<u8>, RenderError> {
        let Self {
            doc: mut template,
            page_ids: template_ids,
            ..
        } = self;

        let mut overlay = Document::load_mem(overlay_pdf)
            .map_err(|e| RenderError::Template(format!("cannot parse overlay: {e}")))?;
        let overlay_count = overlay.get_pages().len();
        if overlay_count != template_ids.len() {
            return Err(RenderError::Template(format!(
                "overlay has {} pages, template has {}",
                overlay_count,
                template_ids.len()
            )));
        }

        overlay.renumber_objects_with(template.max_id + 1);
        let overlay_ids: Vec<ObjectId> = overlay.get_pages().values().copied().collect();
        if overlay.max_id > template.max_id {
            template.max_id = overlay.max_id;
        }
        template.objects.extend(overlay.objects);

        for (index, (template_page, overlay_page)) in
            template_ids.iter().zip(overlay_ids.iter()).enumerate()
        {
            let content = template.get_page_content(*overlay_page)?;
            let bbox = inherited(&template, *overlay_page, b"MediaBox")
                .unwrap_or_else(|| Object::Array(vec![0.into(), 0.into(), 595.into(), 842.into()]));
            let overlay_resources = inherited(&template, *overlay_page, b"Resources")
                .map(|r| resolve_dict(&template, &r))
                .unwrap_or_default();

            let form = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Form",
                    "FormType" => 1,
                    "BBox" => bbox,
                    "Resources" => Object::Dictionary(overlay_resources),
                },
                content,
            );
            let form_id = template.add_object(form);
            let form_name = format!("BgOverlay{}", index + 1);

            let mut resources = inherited(&template, *template_page, b"Resources")
                .map(|r| resolve_dict(&template, &r))
                .unwrap_or_default();
            let mut xobjects = resources
                .get(b"XObject")
                .ok()
                .map(|x| resolve_dict(&template, x))
                .unwrap_or_default();
            xobjects.set(form_name.as_bytes().to_vec(), Object::Reference(form_id));
            resources.set("XObject", Object::Dictionary(xobjects));

            template
                .get_object_mut(*template_page)
                .and_then(Object::as_dict_mut)?
                .set("Resources", Object::Dictionary(resources));

            let invoke = format!("q /{} Do Q\n", form_name).into_bytes();
            template.add_page_contents(*template_page, invoke)?;
        }

        template.prune_objects();
        template.renumber_objects();
        template.compress();

        let mut out = Vec::new();
        template
            .save_to(&mut out)
            .map_err(|e| RenderError::Template(format!("cannot write stamped pdf: {e}")))?;
        Ok(out)
    }
}

/// Look up a page attribute, following the `Parent` chain for inheritable
/// keys.
fn inherited(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = doc.get_object(page_id).and_then(Object::as_dict).ok()?;
    // Page trees deeper than this are malformed.
    for _ in 0..32 {
        if let Ok(value) = current.get(key) {
            return Some(value.clone());
        }
        let parent = current.get(b"Parent").and_then(Object::as_reference).ok()?;
        current = doc.get_object(parent).and_then(Object::as_dict).ok()?;
    }
    None
}

fn resolve_dict(doc: &Document, obj: &Object) -> Dictionary {
    match obj {
        Object::Dictionary(d) => d.clone(),
        Object::Reference(id) => doc
            .get_object(*id)
            .ok()
            .and_then(|o| o.as_dict().ok())
            .cloned()
            .unwrap_or_default(),
        _ => Dictionary::new(),
    }
}

fn media_box_size(doc: &Document, page_id: ObjectId) -> Result<(f64, f64), RenderError> {
    let media_box = inherited(doc, page_id, b"MediaBox")
        .ok_or_else(|| RenderError::Template("template page has no MediaBox".to_string()))?;
    let values: Vec<f64> = match &media_box {
        Object::Array(items) => items.iter().filter_map(number).collect(),
        Object::Reference(id) => doc
            .get_object(*id)
            .and_then(Object::as_array)
            .map(|items| items.iter().filter_map(number).collect())
            .unwrap_or_default(),
        _ => Vec::new(),
    };
    match values.as_slice() {
        [x0, y0, x1, y1] if x1 > x0 && y1 > y0 => Ok((x1 - x0, y1 - y0)),
        _ => Err(RenderError::Template(format!(
            "template MediaBox is malformed: {:?}",
            values
        ))),
    }
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}
