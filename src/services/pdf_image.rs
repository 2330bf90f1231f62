//! PDF 图片对象解码
//!
//! 把页面上的图片 XObject 还原成位图，供 OCR 使用：
//! - `DCTDecode`（JPEG）交给 `image` 解码，前面可以套 `FlateDecode` 等通用过滤器
//! - 其余按 `BitsPerComponent`（1/2/4/8/16）和 `ColorSpace` 展开原始采样
//! - `CCITTFaxDecode`、`JBIG2Decode`、`JPXDecode` 以及未知颜色空间视为不支持，由调用方跳过

use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document, Object, Stream};

/// 无法识别的编码
const UNSUPPORTED_FILTERS: [&str; 3] = ["CCITTFaxDecode", "JBIG2Decode", "JPXDecode"];

/// 解码失败的两种情况
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageIssue {
    /// 编码或颜色空间不支持，跳过该图片
    Unsupported(String),
    /// 数据损坏，整个文档失败
    Corrupt(String),
}

impl ImageIssue {
    fn corrupt(reason: impl Into<String>) -> Self {
        ImageIssue::Corrupt(reason.into())
    }

    fn unsupported(reason: impl Into<String>) -> Self {
        ImageIssue::Unsupported(reason.into())
    }
}

/// 颜色模型
#[derive(Debug, Clone, PartialEq, Eq)]
enum ColorModel {
    Gray,
    Rgb,
    Cmyk,
    /// 调色板：采样值是 `lookup` 中的下标
    Indexed {
        base: Box<ColorModel>,
        hival: usize,
        lookup: Vec<u8>,
    },
}

impl ColorModel {
    /// 每个像素的采样数
    fn components(&self) -> usize {
        match self {
            ColorModel::Gray | ColorModel::Indexed { .. } => 1,
            ColorModel::Rgb => 3,
            ColorModel::Cmyk => 4,
        }
    }
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Result<&'a Object, ImageIssue> {
    match object {
        Object::Reference(id) => doc.get_object(*id).map_err(|e| ImageIssue::corrupt(e.to_string())),
        other => Ok(other),
    }
}

fn name_of(object: &Object) -> Option<String> {
    object
        .as_name()
        .ok()
        .map(|name| String::from_utf8_lossy(name).into_owned())
}

/// 按解码顺序列出过滤器
fn filter_names(doc: &Document, dict: &Dictionary) -> Result<Vec<String>, ImageIssue> {
    let Ok(filter) = dict.get(b"Filter") else {
        return Ok(Vec::new());
    };
    match resolve(doc, filter)? {
        Object::Array(items) => Ok(items.iter().filter_map(name_of).collect()),
        other => Ok(name_of(other).into_iter().collect()),
    }
}

fn color_model_by_name(name: &str) -> Result<ColorModel, ImageIssue> {
    match name {
        "DeviceGray" | "CalGray" | "G" => Ok(ColorModel::Gray),
        "DeviceRGB" | "CalRGB" | "RGB" => Ok(ColorModel::Rgb),
        "DeviceCMYK" | "CMYK" => Ok(ColorModel::Cmyk),
        other => Err(ImageIssue::unsupported(format!("color space {}", other))),
    }
}

/// 解析颜色空间
fn color_model(doc: &Document, object: &Object) -> Result<ColorModel, ImageIssue> {
    let object = resolve(doc, object)?;
    if let Some(name) = name_of(object) {
        return color_model_by_name(&name);
    }

    let items = object
        .as_array()
        .map_err(|_| ImageIssue::corrupt("ColorSpace is neither a name nor an array"))?;
    let family = items
        .first()
        .and_then(name_of)
        .ok_or_else(|| ImageIssue::corrupt("ColorSpace array has no family name"))?;

    match family.as_str() {
        "CalGray" | "CalRGB" => color_model_by_name(&family),
        "ICCBased" => {
            let profile = items
                .get(1)
                .ok_or_else(|| ImageIssue::corrupt("ICCBased without a profile"))?;
            let components = resolve(doc, profile)?
                .as_stream()
                .and_then(|stream| stream.dict.get(b"N"))
                .and_then(Object::as_i64)
                .map_err(|e| ImageIssue::corrupt(format!("ICC profile: {}", e)))?;
            match components {
                1 => Ok(ColorModel::Gray),
                3 => Ok(ColorModel::Rgb),
                4 => Ok(ColorModel::Cmyk),
                n => Err(ImageIssue::unsupported(format!("ICC profile with {} components", n))),
            }
        }
        "Indexed" | "I" => {
            let [_, base, hival, lookup] = items.as_slice() else {
                return Err(ImageIssue::corrupt("Indexed color space needs 4 entries"));
            };
            let base = color_model(doc, base)?;
            if matches!(base, ColorModel::Indexed { .. }) {
                return Err(ImageIssue::corrupt("Indexed base cannot be Indexed"));
            }
            let hival = resolve(doc, hival)?
                .as_i64()
                .ok()
                .and_then(|v| usize::try_from(v).ok())
                .ok_or_else(|| ImageIssue::corrupt("Indexed hival is not a number"))?;
            let lookup = match resolve(doc, lookup)? {
                Object::String(bytes, _) => bytes.clone(),
                Object::Stream(stream) => plain_bytes(doc, stream, &filter_names(doc, &stream.dict)?)?,
                _ => return Err(ImageIssue::corrupt("Indexed lookup is not a string")),
            };
            Ok(ColorModel::Indexed {
                base: Box::new(base),
                hival,
                lookup,
            })
        }
        other => Err(ImageIssue::unsupported(format!("color space {}", other))),
    }
}

/// 用通用过滤器（Flate/LZW/ASCII85）解出字节
///
/// `lopdf` 拒绝直接解压 `Subtype /Image` 的流，这里用只含过滤器参数的字典重新包一层。
fn plain_bytes(doc: &Document, stream: &Stream, filters: &[String]) -> Result<Vec<u8>, ImageIssue> {
    if filters.is_empty() {
        return Ok(stream.content.clone());
    }

    let mut dict = Dictionary::new();
    dict.set(
        "Filter",
        Object::Array(
            filters
                .iter()
                .map(|f| Object::Name(f.as_bytes().to_vec()))
                .collect(),
        ),
    );
    if let Ok(params) = stream.dict.get(b"DecodeParms") {
        let params = match resolve(doc, params)? {
            Object::Array(items) => items.first().and_then(|p| resolve(doc, p).ok()),
            other => Some(other),
        };
        if let Some(Object::Dictionary(params)) = params {
            dict.set("DecodeParms", params.clone());
        }
    }

    Stream::new(dict, stream.content.clone())
        .decompressed_content()
        .map_err(|e| ImageIssue::corrupt(format!("could not decompress samples: {}", e)))
}

/// `Decode` 为 `[1 0]` 时灰度取反
fn inverted_decode(doc: &Document, dict: &Dictionary) -> bool {
    let Ok(decode) = dict.get(b"Decode") else {
        return false;
    };
    let Ok(Ok(items)) = resolve(doc, decode).map(Object::as_array) else {
        return false;
    };
    let values: Vec<f32> = items.iter().filter_map(|v| v.as_float().ok()).collect();
    matches!(values.as_slice(), [first, second, ..] if first > second)
}

fn dimension(dict: &Dictionary, key: &[u8]) -> Result<u32, ImageIssue> {
    let label = String::from_utf8_lossy(key);
    dict.get(key)
        .and_then(Object::as_i64)
        .ok()
        .and_then(|v| u32::try_from(v).ok())
        .filter(|v| *v > 0)
        .ok_or_else(|| ImageIssue::corrupt(format!("invalid {}", label)))
}

/// 把图片流还原成位图
pub fn decode_image(doc: &Document, stream: &Stream) -> Result<DynamicImage, ImageIssue> {
    let dict = &stream.dict;
    let filters = filter_names(doc, dict)?;

    if let Some(filter) = filters.iter().find(|f| UNSUPPORTED_FILTERS.contains(&f.as_str())) {
        return Err(ImageIssue::unsupported(format!("{} image", filter)));
    }

    if let Some((last, outer)) = filters.split_last() {
        if last == "DCTDecode" {
            let jpeg = plain_bytes(doc, stream, outer)?;
            return image::load_from_memory(&jpeg).map_err(|e| ImageIssue::corrupt(e.to_string()));
        }
    }

    let width = dimension(dict, b"Width")?;
    let height = dimension(dict, b"Height")?;

    let is_mask = dict
        .get(b"ImageMask")
        .and_then(Object::as_bool)
        .unwrap_or(false);
    let (model, bits) = if is_mask {
        (ColorModel::Gray, 1)
    } else {
        let color_space = dict
            .get(b"ColorSpace")
            .map_err(|_| ImageIssue::unsupported("image without ColorSpace"))?;
        let bits = dict
            .get(b"BitsPerComponent")
            .and_then(Object::as_i64)
            .map_err(|_| ImageIssue::corrupt("missing BitsPerComponent"))?;
        (color_model(doc, color_space)?, bits)
    };
    let bits = match bits {
        1 | 2 | 4 | 8 | 16 => bits as u32,
        other => return Err(ImageIssue::corrupt(format!("{} bits per component", other))),
    };

    let data = plain_bytes(doc, stream, &filters)?;
    let samples = unpack_samples(&data, width, height, model.components(), bits)?;
    let invert = inverted_decode(doc, dict);

    samples_to_image(width, height, &model, bits, invert, samples)
}

/// 按行展开采样值（每行按字节对齐）
///
/// 16 位采样只保留高字节；其余保留原始值，不做缩放。
fn unpack_samples(
    data: &[u8],
    width: u32,
    height: u32,
    components: usize,
    bits: u32,
) -> Result<Vec<u8>, ImageIssue> {
    let per_row = width as usize * components;
    let stride = (per_row * bits as usize).div_ceil(8);
    let needed = stride * height as usize;
    if data.len() < needed {
        return Err(ImageIssue::corrupt(format!(
            "{} bytes do not fit a {}x{} image ({} needed)",
            data.len(),
            width,
            height,
            needed
        )));
    }

    let mut samples = Vec::with_capacity(per_row * height as usize);
    for row in data[..needed].chunks_exact(stride) {
        match bits {
            8 => samples.extend_from_slice(&row[..per_row]),
            16 => samples.extend(row.chunks_exact(2).take(per_row).map(|pair| pair[0])),
            _ => {
                let per_byte = 8 / bits as usize;
                let mask = (1u8 << bits) - 1;
                samples.extend((0..per_row).map(|i| {
                    let byte = row[i / per_byte];
                    let shift = 8 - bits as usize * (i % per_byte + 1);
                    (byte >> shift) & mask
                }));
            }
        }
    }
    Ok(samples)
}

/// 采样值缩放到 0..=255
fn scale(value: u8, bits: u32) -> u8 {
    match bits {
        1 => value * 255,
        2 => value * 85,
        4 => value * 17,
        _ => value,
    }
}

fn cmyk_to_rgb(c: u8, m: u8, y: u8, k: u8) -> [u8; 3] {
    let channel = |v: u8| ((255 - v as u32) * (255 - k as u32) / 255) as u8;
    [channel(c), channel(m), channel(y)]
}

/// 按基础颜色模型把一个像素的分量转成 RGB
fn to_rgb(base: &ColorModel, pixel: &[u8]) -> [u8; 3] {
    match (base, pixel) {
        (ColorModel::Gray, [g, ..]) => [*g, *g, *g],
        (ColorModel::Rgb, [r, g, b, ..]) => [*r, *g, *b],
        (ColorModel::Cmyk, [c, m, y, k, ..]) => cmyk_to_rgb(*c, *m, *y, *k),
        _ => [0, 0, 0],
    }
}

fn samples_to_image(
    width: u32,
    height: u32,
    model: &ColorModel,
    bits: u32,
    invert: bool,
    samples: Vec<u8>,
) -> Result<DynamicImage, ImageIssue> {
    let size_error = || ImageIssue::corrupt("sample count does not match image size");

    match model {
        ColorModel::Gray => {
            let pixels = samples
                .into_iter()
                .map(|v| {
                    let v = scale(v, bits);
                    if invert {
                        255 - v
                    } else {
                        v
                    }
                })
                .collect();
            GrayImage::from_raw(width, height, pixels)
                .map(DynamicImage::ImageLuma8)
                .ok_or_else(size_error)
        }
        ColorModel::Rgb => {
            let pixels = samples.into_iter().map(|v| scale(v, bits)).collect();
            RgbImage::from_raw(width, height, pixels)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(size_error)
        }
        ColorModel::Cmyk => {
            let pixels = samples
                .chunks_exact(4)
                .flat_map(|p| {
                    let p: Vec<u8> = p.iter().map(|v| scale(*v, bits)).collect();
                    to_rgb(&ColorModel::Cmyk, &p)
                })
                .collect();
            RgbImage::from_raw(width, height, pixels)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(size_error)
        }
        ColorModel::Indexed {
            base,
            hival,
            lookup,
        } => {
            let n = base.components();
            let mut pixels = Vec::with_capacity(samples.len() * 3);
            for index in samples {
                let index = (index as usize).min(*hival);
                let entry = lookup
                    .get(index * n..index * n + n)
                    .ok_or_else(|| ImageIssue::corrupt("palette index outside lookup table"))?;
                pixels.extend(to_rgb(base, entry));
            }
            RgbImage::from_raw(width, height, pixels)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(size_error)
        }
    }
}
