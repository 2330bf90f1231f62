//! 试题 PDF 导出 - 业务能力层
//!
//! 把题目文本按分区排版成固定版式的 PDF：
//! Letter 纸张，上下边距 50pt，左右边距 30pt，居中标题，分区标题，带编号的题目和缩进的选项。
//!
//! 排版分两步：先把内容转成 [`Block`] 序列，再按页面高度切分成 [`Page`]，最后用 `lopdf` 写出。

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::services::question_parser::{numbered_entries, parse_sections, Entry};

pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;
pub const MARGIN_TOP: f32 = 50.0;
pub const MARGIN_BOTTOM: f32 = 50.0;
pub const MARGIN_LEFT: f32 = 30.0;
pub const MARGIN_RIGHT: f32 = 30.0;

pub const PDF_MIME: &str = "application/pdf";

/// 下载文件名 `<topic>_questions.pdf`
pub fn download_file_name(topic: &str) -> String {
    format!("{}_questions.pdf", topic)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource_name(self) -> &'static [u8] {
        match self {
            Font::Regular => b"F1",
            Font::Bold => b"F2",
        }
    }

    /// 字形宽度（千分之一字号，取自 Helvetica / Helvetica-Bold 标准 AFM）
    fn glyph_width(self, c: char) -> u16 {
        let table = match self {
            Font::Regular => &HELVETICA_WIDTHS,
            Font::Bold => &HELVETICA_BOLD_WIDTHS,
        };
        match c {
            ' '..='~' => table[c as usize - 0x20],
            '\u{2014}' | '\u{2026}' | '\u{2030}' | '\u{C6}' | '\u{152}' => 1000,
            // 其余 WinAnsi 字符按较宽的大写字母估算
            _ => 722,
        }
    }
}

/// ASCII 0x20..=0x7E
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// 段落样式
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Style {
    pub font: Font,
    pub size: f32,
    pub leading: f32,
    pub left_indent: f32,
    pub space_before: f32,
    pub space_after: f32,
    pub centered: bool,
}

pub const TITLE_STYLE: Style = Style {
    font: Font::Bold,
    size: 18.0,
    leading: 22.0,
    left_indent: 0.0,
    space_before: 0.0,
    space_after: 20.0,
    centered: true,
};

pub const SECTION_STYLE: Style = Style {
    font: Font::Bold,
    size: 14.0,
    leading: 17.0,
    left_indent: 0.0,
    space_before: 20.0,
    space_after: 10.0,
    centered: false,
};

pub const QUESTION_STYLE: Style = Style {
    font: Font::Regular,
    size: 10.0,
    leading: 12.0,
    left_indent: 10.0,
    space_before: 0.0,
    space_after: 5.0,
    centered: false,
};

pub const OPTION_STYLE: Style = Style {
    font: Font::Regular,
    size: 10.0,
    leading: 12.0,
    left_indent: 20.0,
    space_before: 0.0,
    space_after: 0.0,
    centered: false,
};

/// 排版单元
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph { text: String, style: Style },
    Spacer(f32),
}

impl Block {
    fn paragraph(text: impl Into<String>, style: Style) -> Self {
        Block::Paragraph {
            text: text.into(),
            style,
        }
    }
}

/// 把题目文本转成排版单元
pub fn build_blocks(topic: &str, questions_text: &str) -> Vec<Block> {
    let mut blocks = vec![
        Block::paragraph(format!("Test Questions: {}", topic), TITLE_STYLE),
        Block::Spacer(20.0),
    ];

    let sections = parse_sections(questions_text);
    for (section, lines) in sections.non_empty() {
        blocks.push(Block::paragraph(section.title(), SECTION_STYLE));
        for entry in numbered_entries(section, lines) {
            let block = match entry {
                Entry::Question { number, text } => {
                    Block::paragraph(format!("{}. {}", number, text), QUESTION_STYLE)
                }
                Entry::Option(text) => Block::paragraph(text, OPTION_STYLE),
            };
            blocks.push(block);
            blocks.push(Block::Spacer(8.0));
        }
        blocks.push(Block::Spacer(20.0));
    }
    blocks
}

/// 页面上的一行文字（坐标为 PDF 坐标系，原点在左下角）
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub x: f32,
    pub baseline: f32,
    pub font: Font,
    pub size: f32,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub lines: Vec<PlacedLine>,
}

fn text_width(text: &str, font: Font, size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(font.glyph_width(c))).sum();
    units as f32 * size / 1000.0
}

/// 按宽度折行，超长单词按字符切开
pub fn wrap_text(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let fits = |line: &str| text_width(line, font, size) <= max_width;
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if fits(&candidate) {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }

        for c in word.chars() {
            current.push(c);
            if !fits(&current) && current.chars().count() > 1 {
                current.pop();
                lines.push(std::mem::take(&mut current));
                current.push(c);
            }
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// 按页面高度分页
pub fn layout(blocks: &[Block]) -> Vec<Page> {
    let top = PAGE_HEIGHT - MARGIN_TOP;
    let frame_width = PAGE_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;

    let mut pages = vec![Page::default()];
    let mut y = top;

    for block in blocks {
        match block {
            Block::Spacer(height) => {
                y -= height;
                if y < MARGIN_BOTTOM {
                    pages.push(Page::default());
                    y = top;
                }
            }
            Block::Paragraph { text, style } => {
                // 页首不留段前空白
                if y < top {
                    y -= style.space_before;
                }
                let width = frame_width - style.left_indent;
                for line in wrap_text(text, style.font, style.size, width) {
                    if y - style.leading < MARGIN_BOTTOM {
                        pages.push(Page::default());
                        y = top;
                    }
                    let x = if style.centered {
                        let w = text_width(&line, style.font, style.size);
                        MARGIN_LEFT + ((frame_width - w) / 2.0).max(0.0)
                    } else {
                        MARGIN_LEFT + style.left_indent
                    };
                    if let Some(page) = pages.last_mut() {
                        page.lines.push(PlacedLine {
                            x,
                            baseline: y - style.size,
                            font: style.font,
                            size: style.size,
                            text: line,
                        });
                    }
                    y -= style.leading;
                }
                y -= style.space_after;
            }
        }
    }

    // 末尾的空白可能多开一页
    if pages.len() > 1 && pages.last().is_some_and(|p| p.lines.is_empty()) {
        pages.pop();
    }
    pages
}

/// 编码为 WinAnsi，无法表示的字符替换为 `?`
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' => c as u8,
            '\u{A0}'..='\u{FF}' => c as u32 as u8,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{2026}' => 0x85,
            '\u{20AC}' => 0x80,
            _ => b'?',
        })
        .collect()
}

fn write_pdf(pages: &[Page]) -> AppResult<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular_id,
            "F2" => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in pages {
        let mut operations = Vec::with_capacity(page.lines.len() * 5);
        for line in &page.lines {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new(
                "Tf",
                vec![
                    Object::Name(line.font.resource_name().to_vec()),
                    line.size.into(),
                ],
            ));
            operations.push(Operation::new(
                "Td",
                vec![line.x.into(), line.baseline.into()],
            ));
            operations.push(Operation::new(
                "Tj",
                vec![Object::string_literal(encode_win_ansi(&line.text))],
            ));
            operations.push(Operation::new("ET", vec![]));
        }

        let content = Content { operations }
            .encode()
            .map_err(AppError::pdf_write_failed)?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).map_err(AppError::pdf_write_failed)?;
    Ok(buffer)
}

/// 生成试题 PDF
///
/// # 参数
/// - `topic`: 标题中的主题
/// - `questions_text`: 去掉答案区后的题目文本
pub fn render_questions_pdf(topic: &str, questions_text: &str) -> AppResult<Vec<u8>> {
    let blocks = build_blocks(topic, questions_text);
    let pages = layout(&blocks);
    debug!("试题 PDF 排版完成: {} 个单元, {} 页", blocks.len(), pages.len());
    write_pdf(&pages)
}
