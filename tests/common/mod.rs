//! In-memory word-processing packages for integration tests.

#![allow(dead_code)]

use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Two tiny PNGs with distinct content, so distinct hashes.
pub const PNG_A: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01\x08\x06\0\0\0\x1f\x15\xc4\x89";
pub const PNG_B: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x02\0\0\0\x02\x08\x06\0\0\0\x72\xb6\x0d\x24";

struct Rel {
    id: String,
    kind: &'static str,
    target: String,
    external: bool,
}

struct Part {
    path: String,
    xml: String,
    rels: Vec<Rel>,
}

/// Builds a minimal but well-formed `.docx`.
#[derive(Default)]
pub struct DocxBuilder {
    body: String,
    rels: Vec<Rel>,
    parts: Vec<Part>,
    files: Vec<(String, Vec<u8>)>,
}

impl DocxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Body content of the main document (paragraphs, tables).
    pub fn body(mut self, xml: &str) -> Self {
        self.body.push_str(xml);
        self
    }

    /// Add a media file referenced from the main document as `id`.
    pub fn image(mut self, id: &str, name: &str, data: &[u8]) -> Self {
        self.rels.push(Rel {
            id: id.to_string(),
            kind: "image",
            target: format!("media/{name}"),
            external: false,
        });
        self.add_media(name, data)
    }

    /// Add a media file without a relationship (for shared references).
    pub fn add_media(mut self, name: &str, data: &[u8]) -> Self {
        let path = format!("word/media/{name}");
        if !self.files.iter().any(|(p, _)| *p == path) {
            self.files.push((path, data.to_vec()));
        }
        self
    }

    pub fn hyperlink(mut self, id: &str, url: &str) -> Self {
        self.rels.push(Rel {
            id: id.to_string(),
            kind: "hyperlink",
            target: url.to_string(),
            external: true,
        });
        self
    }

    /// Add a header part with its own body and image relationships.
    pub fn header(mut self, id: &str, name: &str, body: &str, images: &[(&str, &str)]) -> Self {
        self.rels.push(Rel {
            id: id.to_string(),
            kind: "header",
            target: name.to_string(),
            external: false,
        });
        self.parts.push(Part {
            path: format!("word/{name}"),
            xml: format!(r#"<w:hdr xmlns:w="{W_NS}" xmlns:r="{R_NS}">{body}</w:hdr>"#),
            rels: images
                .iter()
                .map(|(id, media)| Rel {
                    id: id.to_string(),
                    kind: "image",
                    target: format!("media/{media}"),
                    external: false,
                })
                .collect(),
        });
        self
    }

    pub fn styles(mut self, inner: &str) -> Self {
        self.rels.push(Rel {
            id: "rIdStyles".to_string(),
            kind: "styles",
            target: "styles.xml".to_string(),
            external: false,
        });
        self.parts.push(Part {
            path: "word/styles.xml".to_string(),
            xml: format!(r#"<w:styles xmlns:w="{W_NS}">{inner}</w:styles>"#),
            rels: Vec::new(),
        });
        self
    }

    pub fn theme(mut self, xml: &str) -> Self {
        self.rels.push(Rel {
            id: "rIdTheme".to_string(),
            kind: "theme",
            target: "theme/theme1.xml".to_string(),
            external: false,
        });
        self.parts.push(Part {
            path: "word/theme/theme1.xml".to_string(),
            xml: xml.to_string(),
            rels: Vec::new(),
        });
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut write = |name: &str, data: &[u8]| {
            zip.start_file(name, options).unwrap();
            zip.write_all(data).unwrap();
        };

        write("[Content_Types].xml", CONTENT_TYPES.as_bytes());
        write(
            "_rels/.rels",
            rels_xml(&[Rel {
                id: "rId1".to_string(),
                kind: "officeDocument",
                target: "word/document.xml".to_string(),
                external: false,
            }])
            .as_bytes(),
        );
        write(
            "word/document.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{W_NS}" xmlns:r="{R_NS}" xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:v="urn:schemas-microsoft-com:vml" xmlns:o="urn:schemas-microsoft-com:office:office"><w:body>{}<w:sectPr/></w:body></w:document>"#,
                self.body
            )
            .as_bytes(),
        );
        write("word/_rels/document.xml.rels", rels_xml(&self.rels).as_bytes());
        for part in &self.parts {
            write(&part.path, part.xml.as_bytes());
            if !part.rels.is_empty() {
                let (dir, name) = part.path.rsplit_once('/').unwrap();
                write(&format!("{dir}/_rels/{name}.rels"), rels_xml(&part.rels).as_bytes());
            }
        }
        for (path, data) in &self.files {
            write(path, data);
        }

        zip.finish().unwrap().into_inner()
    }
}

fn rels_xml(rels: &[Rel]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for rel in rels {
        let mode = if rel.external { r#" TargetMode="External""# } else { "" };
        xml.push_str(&format!(
            r#"<Relationship Id="{}" Type="{REL_BASE}/{}" Target="{}"{mode}/>"#,
            rel.id, rel.kind, rel.target
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

/// Paragraph with a single plain run.
pub fn paragraph(text: &str) -> String {
    format!(r#"<w:p><w:r><w:t xml:space="preserve">{text}</w:t></w:r></w:p>"#)
}

/// Paragraph holding an inline DrawingML picture that embeds `rel_id`.
pub fn drawing(rel_id: &str) -> String {
    format!(
        r#"<w:p><w:r><w:drawing><wp:inline><wp:docPr id="1" name="Picture 1"/><a:graphic><a:graphicData><a:blip r:embed="{rel_id}"/></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#
    )
}

/// Paragraph holding a legacy VML picture that embeds `rel_id`.
pub fn vml_picture(rel_id: &str) -> String {
    format!(
        r#"<w:p><w:r><w:pict><v:shape><v:imagedata r:id="{rel_id}" o:title=""/></v:shape></w:pict></w:r></w:p>"#
    )
}

/// Read one part of a package as text.
pub fn read_part(package: &[u8], path: &str) -> Option<String> {
    let mut archive = ZipArchive::new(Cursor::new(package)).unwrap();
    let mut file = archive.by_name(path).ok()?;
    let mut text = String::new();
    file.read_to_string(&mut text).unwrap();
    Some(text)
}

/// Read one entry of a package as bytes.
pub fn read_bytes(package: &[u8], path: &str) -> Option<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(package)).unwrap();
    let mut file = archive.by_name(path).ok()?;
    let mut data = Vec::new();
    file.read_to_end(&mut data).unwrap();
    Some(data)
}
