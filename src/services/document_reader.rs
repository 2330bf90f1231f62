//! 文档文本提取 - 业务能力层
//!
//! 逐页提取 PDF 的文本，并对每页内嵌的图片做 OCR，把识别结果追加在该页文本之后：
//!
//! ```text
//! <第 1 页文本>
//!
//! [Image 1 OCR Text]:
//! <识别结果>
//! ```
//!
//! 解析、解码、OCR 的失败直接向上返回，不做恢复；
//! 无法识别的图片编码（传真、JBIG2、JPEG 2000 等）只记录警告并跳过该图片。

use std::io::{Cursor, Write};
use std::process::{Command, Stdio};

use image::{DynamicImage, ImageFormat};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, warn};

use crate::error::{AppError, AppResult, DocumentError};
use crate::services::pdf_image::{decode_image, ImageIssue};

/// OCR 能力
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image: &DynamicImage) -> AppResult<String>;
}

/// 调用本地 `tesseract` 可执行文件做 OCR
///
/// 图片编码成 PNG 后通过 stdin 传入，识别结果从 stdout 读取。
pub struct TesseractCli {
    command: String,
}

impl TesseractCli {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

impl OcrEngine for TesseractCli {
    fn recognize(&self, image: &DynamicImage) -> AppResult<String> {
        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| AppError::ocr_failed(format!("could not encode image: {}", e)))?;

        let mut child = Command::new(&self.command)
            .args(["stdin", "stdout"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AppError::ocr_failed(format!("could not start {}: {}", self.command, e)))?;

        {
            let stdin = child
                .stdin
                .as_mut()
                .ok_or_else(|| AppError::ocr_failed("tesseract stdin unavailable"))?;
            stdin
                .write_all(&png)
                .map_err(|e| AppError::ocr_failed(e.to_string()))?;
        }
        drop(child.stdin.take());

        let output = child
            .wait_with_output()
            .map_err(|e| AppError::ocr_failed(e.to_string()))?;
        if !output.status.success() {
            return Err(AppError::ocr_failed(format!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// 从 PDF 字节中提取全部文本（含图片 OCR）
///
/// 没有页面时返回空字符串；只有文字的页面不会出现 OCR 标记。
pub fn extract_text_from_pdf(bytes: &[u8], ocr: &dyn OcrEngine) -> AppResult<String> {
    let doc = Document::load_mem(bytes).map_err(AppError::pdf_parse_failed)?;
    let pages = doc.get_pages();
    debug!("PDF 共 {} 页", pages.len());

    let mut text = String::new();
    for (page_number, page_id) in pages {
        let page_text = doc.extract_text(&[page_number]).map_err(|e| {
            AppError::Document(DocumentError::TextExtractionFailed {
                page: page_number,
                source: Box::new(e),
            })
        })?;
        text.push_str(&page_text);
        text.push('\n');

        let images = page_images(&doc, page_id).map_err(AppError::pdf_parse_failed)?;
        for (index, stream) in images.into_iter().enumerate() {
            let image = match decode_image(&doc, stream) {
                Ok(image) => image,
                Err(ImageIssue::Unsupported(reason)) => {
                    warn!(
                        "⚠️ 第 {} 页图片 {} 无法识别，跳过 OCR: {}",
                        page_number,
                        index + 1,
                        reason
                    );
                    continue;
                }
                Err(ImageIssue::Corrupt(reason)) => {
                    return Err(AppError::Document(DocumentError::ImageDecodeFailed {
                        page: page_number,
                        image_index: index + 1,
                        reason,
                    }));
                }
            };
            let ocr_text = ocr.recognize(&image)?;
            debug!(
                "第 {} 页图片 {} OCR 完成: {} 字符",
                page_number,
                index + 1,
                ocr_text.chars().count()
            );
            text.push_str(&format!("\n[Image {} OCR Text]:\n{}", index + 1, ocr_text));
        }
    }
    Ok(text)
}

fn resolve_dict<'a>(doc: &'a Document, object: &'a Object) -> lopdf::Result<&'a Dictionary> {
    match object {
        Object::Reference(id) => doc.get_dictionary(*id),
        other => other.as_dict(),
    }
}

/// 页面资源字典，页面自身没有时沿 Parent 向上继承
fn page_resources(doc: &Document, page_id: ObjectId) -> lopdf::Result<Option<&Dictionary>> {
    let mut node = doc.get_dictionary(page_id)?;
    loop {
        if let Ok(resources) = node.get(b"Resources") {
            return resolve_dict(doc, resources).map(Some);
        }
        match node.get(b"Parent") {
            Ok(parent) => node = resolve_dict(doc, parent)?,
            Err(_) => return Ok(None),
        }
    }
}

/// 按资源字典中的顺序列出页面的图片 XObject
fn page_images(doc: &Document, page_id: ObjectId) -> lopdf::Result<Vec<&Stream>> {
    let Some(resources) = page_resources(doc, page_id)? else {
        return Ok(Vec::new());
    };
    let Ok(xobjects) = resources.get(b"XObject") else {
        return Ok(Vec::new());
    };
    let xobjects = resolve_dict(doc, xobjects)?;

    let mut images = Vec::new();
    for (_, value) in xobjects.iter() {
        let Ok(id) = value.as_reference() else {
            continue;
        };
        let stream = doc.get_object(id)?.as_stream()?;
        let is_image = stream
            .dict
            .get(b"Subtype")
            .and_then(Object::as_name)
            .map(|name| name == b"Image")
            .unwrap_or(false);
        if is_image {
            images.push(stream);
        }
    }
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::dictionary;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedOcr {
        text: &'static str,
        calls: AtomicUsize,
    }

    impl FixedOcr {
        fn new(text: &'static str) -> Self {
            Self {
                text,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl OcrEngine for FixedOcr {
        fn recognize(&self, _image: &DynamicImage) -> AppResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.text.to_string())
        }
    }

    type ImageSpec = (Dictionary, Vec<u8>);

    /// 图片字典（不含 Type/Subtype）和采样数据
    fn image_spec(width: i64, height: i64, extra: Dictionary, data: Vec<u8>) -> ImageSpec {
        let mut dict = dictionary! { "Width" => width, "Height" => height };
        for (key, value) in extra.into_iter() {
            dict.set(key, value);
        }
        (dict, data)
    }

    fn gray_2x2() -> ImageSpec {
        image_spec(
            2,
            2,
            dictionary! { "ColorSpace" => "DeviceGray", "BitsPerComponent" => 8 },
            vec![0, 255, 255, 0],
        )
    }

    /// 构造测试用 PDF：每个元素是一页，可选地在该页放一张图片
    fn build_pdf(pages: &[(&str, Option<ImageSpec>)]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        let mut kids: Vec<Object> = Vec::new();
        for (text, image) in pages {
            let mut operations = vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ];
            let mut resources = dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            };
            if let Some((image_dict, data)) = image {
                let mut dict = dictionary! { "Type" => "XObject", "Subtype" => "Image" };
                for (key, value) in image_dict.iter() {
                    dict.set(key.clone(), value.clone());
                }
                let image_id = doc.add_object(Stream::new(dict, data.clone()));
                resources.set("XObject", dictionary! { "Im1" => image_id });
                operations.push(Operation::new("Do", vec!["Im1".into()]));
            }
            let content = Content { operations }.encode().unwrap();
            let content_id = doc.add_object(Stream::new(dictionary! {}, content));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    #[test]
    fn zero_pages_yield_empty_text() {
        let ocr = FixedOcr::new("unused");
        let text = extract_text_from_pdf(&build_pdf(&[]), &ocr).unwrap();
        assert_eq!(text, "");
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn text_only_pages_have_no_ocr_blocks() {
        let ocr = FixedOcr::new("unused");
        let bytes = build_pdf(&[("Photosynthesis basics", None), ("Chlorophyll", None)]);
        let text = extract_text_from_pdf(&bytes, &ocr).unwrap();

        let first = text.find("Photosynthesis basics").unwrap();
        let second = text.find("Chlorophyll").unwrap();
        assert!(first < second);
        assert!(!text.contains("OCR Text"));
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn images_get_labelled_ocr_blocks() {
        let ocr = FixedOcr::new("diagram label");
        let bytes = build_pdf(&[("Cells", Some(gray_2x2()))]);
        let text = extract_text_from_pdf(&bytes, &ocr).unwrap();

        assert!(text.contains("Cells"));
        assert!(text.ends_with("\n[Image 1 OCR Text]:\ndiagram label"));
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn garbage_bytes_are_a_document_error() {
        let ocr = FixedOcr::new("unused");
        let err = extract_text_from_pdf(b"definitely not a pdf", &ocr).unwrap_err();
        assert!(matches!(err, AppError::Document(DocumentError::PdfParseFailed { .. })));
    }

    #[test]
    fn scanned_one_bit_pages_are_ocred() {
        let ocr = FixedOcr::new("worksheet text");
        let scan = image_spec(
            8,
            8,
            dictionary! { "ColorSpace" => "DeviceGray", "BitsPerComponent" => 1 },
            vec![0b1010_1010; 8],
        );
        let bytes = build_pdf(&[("Worksheet", Some(scan))]);

        let text = extract_text_from_pdf(&bytes, &ocr).unwrap();

        assert!(text.ends_with("\n[Image 1 OCR Text]:\nworksheet text"));
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsupported_images_are_skipped() {
        let ocr = FixedOcr::new("unused");
        let fax = image_spec(
            8,
            8,
            dictionary! {
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 1,
                "Filter" => "CCITTFaxDecode",
            },
            vec![0; 8],
        );
        let bytes = build_pdf(&[("Fax page", Some(fax)), ("Next page", Some(gray_2x2()))]);

        let text = extract_text_from_pdf(&bytes, &ocr).unwrap();

        assert!(text.contains("Fax page"));
        assert!(text.contains("Next page"));
        assert_eq!(text.matches("OCR Text").count(), 1);
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn corrupt_images_fail_the_document() {
        let ocr = FixedOcr::new("unused");
        let broken = image_spec(
            4,
            4,
            dictionary! { "ColorSpace" => "DeviceGray", "BitsPerComponent" => 8 },
            vec![0; 3],
        );
        let err = extract_text_from_pdf(&build_pdf(&[("Broken", Some(broken))]), &ocr).unwrap_err();
        assert!(matches!(
            err,
            AppError::Document(DocumentError::ImageDecodeFailed { page: 1, image_index: 1, .. })
        ));
    }
}
