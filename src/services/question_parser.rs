//! 试题文本解析 - 业务能力层
//!
//! 按行扫描模型返回的题目文本，依据当前所在的题型分区归类，
//! 再为每个分区生成带编号的条目，供 PDF 导出使用。

/// 题型分区
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Mcq,
    Written,
    TrueFalse,
}

impl Section {
    /// 输出顺序
    pub const ORDER: [Section; 3] = [Section::Mcq, Section::Written, Section::TrueFalse];

    /// PDF 中的分区标题
    pub fn title(self) -> &'static str {
        match self {
            Section::Mcq => "MCQ Section",
            Section::Written => "Written Section",
            Section::TrueFalse => "T&F Section",
        }
    }

    /// 识别分区标题行
    fn from_header(line: &str) -> Option<Self> {
        if line.contains("Multiple Choice Questions (MCQ)") {
            Some(Section::Mcq)
        } else if line.contains("Open-Ended Written Questions") || line.contains("Written Questions")
        {
            Some(Section::Written)
        } else if line.contains("True or False") || line.contains("True/False") {
            Some(Section::TrueFalse)
        } else {
            None
        }
    }
}

/// 扫描状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SectionState {
    #[default]
    Unset,
    Active(Section),
}

/// 按分区归类后的题目行
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSections {
    pub mcq: Vec<String>,
    pub written: Vec<String>,
    pub true_false: Vec<String>,
}

impl ParsedSections {
    pub fn lines(&self, section: Section) -> &[String] {
        match section {
            Section::Mcq => &self.mcq,
            Section::Written => &self.written,
            Section::TrueFalse => &self.true_false,
        }
    }

    fn lines_mut(&mut self, section: Section) -> &mut Vec<String> {
        match section {
            Section::Mcq => &mut self.mcq,
            Section::Written => &mut self.written,
            Section::TrueFalse => &mut self.true_false,
        }
    }

    /// 非空分区，按输出顺序
    pub fn non_empty(&self) -> impl Iterator<Item = (Section, &[String])> + '_ {
        Section::ORDER
            .into_iter()
            .map(move |section| (section, self.lines(section)))
            .filter(|(_, lines)| !lines.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.non_empty().next().is_none()
    }
}

/// 扫描题目文本并按分区归类
///
/// 每行先去掉首尾空白：
/// - 命中分区标题 → 切换当前分区（标题行本身不保留）
/// - 空行、含 `Answer Key` 的行、出现在任何标题之前的行 → 丢弃
/// - 其余行 → 追加到当前分区
///
/// 第一个标题之前的内容会被直接丢弃，这里保持该行为不做推断。
pub fn parse_sections(text: &str) -> ParsedSections {
    let (_, sections) = text.split('\n').map(str::trim).fold(
        (SectionState::Unset, ParsedSections::default()),
        |(state, mut sections), line| {
            if let Some(section) = Section::from_header(line) {
                return (SectionState::Active(section), sections);
            }
            match state {
                SectionState::Active(section)
                    if !line.is_empty() && !line.contains(crate::models::ANSWER_KEY_MARKER) =>
                {
                    sections.lines_mut(section).push(line.to_string());
                }
                _ => {}
            }
            (state, sections)
        },
    );
    sections
}

/// 分区内的一个条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// 带编号的题目
    Question { number: usize, text: String },
    /// 选择题选项（缩进、不编号）
    Option(String),
}

const OPTION_PREFIXES: [&str; 4] = ["a)", "b)", "c)", "d)"];

fn is_option_line(line: &str) -> bool {
    OPTION_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
}

/// 为一个分区的行生成条目
///
/// 只有选择题分区识别 `a)`..`d)` 开头的选项行，其他行都获得从 1 开始递增的编号。
pub fn numbered_entries(section: Section, lines: &[String]) -> Vec<Entry> {
    let mut counter = 0;
    lines
        .iter()
        .map(|line| {
            if section == Section::Mcq && is_option_line(line) {
                Entry::Option(line.clone())
            } else {
                counter += 1;
                Entry::Question {
                    number: counter,
                    text: line.clone(),
                }
            }
        })
        .collect()
}
