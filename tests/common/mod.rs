//! In-memory `.docx` packages for the integration tests.
//!
//! Only the parts the pipeline reads are written: `document.xml`, its
//! relationships, `numbering.xml` when lists are used, and media files for
//! embedded pictures.

#![allow(dead_code)]

use html_escape::encode_text;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::{Cursor, Write};

const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const DML_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const WP_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const PKG_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const IMAGE_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

/// A 32×32 gradient PNG, large enough that its base64 payload is stripped.
pub fn sample_png() -> Vec<u8> {
    let img = RgbImage::from_fn(32, 32, |x, y| {
        Rgb([(x * 8) as u8, (y * 8) as u8, ((x ^ y) * 8) as u8])
    });
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .expect("png encoding");
    buf
}

#[derive(Default)]
pub struct DocxBuilder {
    body: String,
    /// (relationship id, target under `word/`)
    rels: Vec<(String, String)>,
    media: Vec<(String, Vec<u8>)>,
    uses_numbering: bool,
    drawings: usize,
}

impl DocxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paragraph(mut self, text: &str) -> Self {
        self.body.push_str(&format!("<w:p>{}</w:p>", run(text, false)));
        self
    }

    /// A paragraph whose only run is bold.
    pub fn bold_paragraph(mut self, text: &str) -> Self {
        self.body.push_str(&format!("<w:p>{}</w:p>", run(text, true)));
        self
    }

    /// A paragraph styled `HeadingN`.
    pub fn heading(mut self, level: u8, text: &str) -> Self {
        self.body.push_str(&format!(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading{level}"/></w:pPr>{}</w:p>"#,
            run(text, false)
        ));
        self
    }

    /// An item of the single decimal list, at `ilvl` `level`.
    pub fn list_item(mut self, level: u8, text: &str) -> Self {
        self.uses_numbering = true;
        self.body.push_str(&format!(
            r#"<w:p><w:pPr><w:numPr><w:ilvl w:val="{level}"/><w:numId w:val="1"/></w:numPr></w:pPr>{}</w:p>"#,
            run(text, false)
        ));
        self
    }

    /// A paragraph with `text` followed by pictures. `embedded` pictures are
    /// stored in the package; `missing` ones reference a relationship that
    /// does not exist, so a converter cannot render them.
    pub fn image_paragraph(mut self, text: &str, embedded: usize, missing: usize) -> Self {
        let mut runs = if text.is_empty() {
            String::new()
        } else {
            run(text, false)
        };
        for _ in 0..embedded {
            self.drawings += 1;
            let n = self.drawings;
            let rel_id = format!("rIdImg{n}");
            let target = format!("media/image{n}.png");
            self.rels.push((rel_id.clone(), target.clone()));
            self.media.push((format!("word/{target}"), sample_png()));
            runs.push_str(&drawing(n, &rel_id));
        }
        for _ in 0..missing {
            self.drawings += 1;
            let n = self.drawings;
            runs.push_str(&drawing(n, &format!("rIdMissing{n}")));
        }
        self.body.push_str(&format!("<w:p>{runs}</w:p>"));
        self
    }

    /// A table of plain-text cells, first row included as an ordinary row.
    pub fn table(mut self, rows: &[&[&str]]) -> Self {
        self.body.push_str("<w:tbl>");
        for row in rows {
            self.body.push_str("<w:tr>");
            for cell in row.iter() {
                self.body
                    .push_str(&format!("<w:tc><w:p>{}</w:p></w:tc>", run(cell, false)));
            }
            self.body.push_str("</w:tr>");
        }
        self.body.push_str("</w:tbl>");
        self
    }

    pub fn build(self) -> Vec<u8> {
        let document = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="{WML_NS}" xmlns:r="{REL_NS}" xmlns:a="{DML_NS}" xmlns:wp="{WP_NS}"><w:body>{}</w:body></w:document>"#,
            self.body
        );
        let rels: String = self
            .rels
            .iter()
            .map(|(id, target)| {
                format!(r#"<Relationship Id="{id}" Type="{IMAGE_REL_TYPE}" Target="{target}"/>"#)
            })
            .collect();
        let rels = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{PKG_REL_NS}">{rels}</Relationships>"#
        );

        let mut parts: Vec<(String, Vec<u8>)> = vec![
            ("[Content_Types].xml".into(), CONTENT_TYPES.as_bytes().to_vec()),
            ("word/document.xml".into(), document.into_bytes()),
            ("word/_rels/document.xml.rels".into(), rels.into_bytes()),
        ];
        if self.uses_numbering {
            parts.push(("word/numbering.xml".into(), numbering_xml().into_bytes()));
        }
        parts.extend(self.media);

        let mut buf = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buf);
            let opts = zip::write::SimpleFileOptions::default();
            for (name, data) in &parts {
                zip.start_file(name.as_str(), opts).expect("zip entry");
                zip.write_all(data).expect("zip write");
            }
            zip.finish().expect("zip finish");
        }
        buf.into_inner()
    }
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="png" ContentType="image/png"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

fn run(text: &str, bold: bool) -> String {
    let rpr = if bold { "<w:rPr><w:b/></w:rPr>" } else { "" };
    format!(
        r#"<w:r>{rpr}<w:t xml:space="preserve">{}</w:t></w:r>"#,
        encode_text(text)
    )
}

fn drawing(n: usize, rel_id: &str) -> String {
    format!(
        r#"<w:r><w:drawing><wp:inline><wp:docPr id="{n}" name="Picture {n}"/><a:graphic><a:graphicData><a:blip r:embed="{rel_id}"/></a:graphicData></a:graphic></wp:inline></w:drawing></w:r>"#
    )
}

fn numbering_xml() -> String {
    let levels: String = (0..3)
        .map(|l| format!(r#"<w:lvl w:ilvl="{l}"><w:numFmt w:val="decimal"/></w:lvl>"#))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:numbering xmlns:w="{WML_NS}"><w:abstractNum w:abstractNumId="0">{levels}</w:abstractNum><w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num></w:numbering>"#
    )
}
