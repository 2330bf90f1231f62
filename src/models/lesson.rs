//! 教案生成的输入模型

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{AppError, AppResult, ValidationError};

/// 年级（下拉框候选）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Grade {
    Kindergarten,
    First,
    Second,
    Third,
    Fourth,
    Fifth,
    Sixth,
    Seventh,
    Eighth,
    Ninth,
    Tenth,
    Eleventh,
    Twelfth,
}

impl Grade {
    pub const ALL: [Grade; 13] = [
        Grade::Kindergarten,
        Grade::First,
        Grade::Second,
        Grade::Third,
        Grade::Fourth,
        Grade::Fifth,
        Grade::Sixth,
        Grade::Seventh,
        Grade::Eighth,
        Grade::Ninth,
        Grade::Tenth,
        Grade::Eleventh,
        Grade::Twelfth,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Grade::Kindergarten => "Kindergarten",
            Grade::First => "1st",
            Grade::Second => "2nd",
            Grade::Third => "3rd",
            Grade::Fourth => "4th",
            Grade::Fifth => "5th",
            Grade::Sixth => "6th",
            Grade::Seventh => "7th",
            Grade::Eighth => "8th",
            Grade::Ninth => "9th",
            Grade::Tenth => "10th",
            Grade::Eleventh => "11th",
            Grade::Twelfth => "12th",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Grade {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        Grade::ALL
            .into_iter()
            .find(|grade| grade.label() == s.trim())
            .ok_or_else(|| {
                ValidationError::UnknownChoice {
                    field: "grade level",
                    value: s.to_string(),
                }
                .into()
            })
    }
}

/// 学生水平
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Proficiency {
    Beginner,
    Intermediate,
    Advanced,
}

impl Proficiency {
    pub const ALL: [Proficiency; 3] = [
        Proficiency::Beginner,
        Proficiency::Intermediate,
        Proficiency::Advanced,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Proficiency::Beginner => "Beginner",
            Proficiency::Intermediate => "Intermediate",
            Proficiency::Advanced => "Advanced",
        }
    }
}

impl fmt::Display for Proficiency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Proficiency {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        Proficiency::ALL
            .into_iter()
            .find(|level| level.label() == s.trim())
            .ok_or_else(|| {
                ValidationError::UnknownChoice {
                    field: "proficiency level",
                    value: s.to_string(),
                }
                .into()
            })
    }
}

/// 课时长度（分钟），表单允许 30..=120
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LessonDuration(u32);

impl LessonDuration {
    pub const MIN: u32 = 30;
    pub const MAX: u32 = 120;
    pub const DEFAULT: u32 = 45;

    pub fn new(minutes: u32) -> AppResult<Self> {
        if !(Self::MIN..=Self::MAX).contains(&minutes) {
            return Err(ValidationError::OutOfRange {
                field: "Lesson duration",
                value: i64::from(minutes),
                min: i64::from(Self::MIN),
                max: i64::from(Self::MAX),
            }
            .into());
        }
        Ok(Self(minutes))
    }

    pub fn minutes(self) -> u32 {
        self.0
    }

    /// 导入环节：总时长 / 6（整数除法）
    pub fn introduction_minutes(self) -> u32 {
        self.0 / 6
    }

    /// 讲授与练习环节：2 × 总时长 / 3（整数除法）
    pub fn teaching_minutes(self) -> u32 {
        2 * self.0 / 3
    }

    /// 总结与评估环节：总时长 / 6（整数除法）
    ///
    /// 三段之和通常小于总时长（45 → 7 + 30 + 7），保持原样不补齐。
    pub fn conclusion_minutes(self) -> u32 {
        self.0 / 6
    }
}

/// 教案生成请求
#[derive(Debug, Clone)]
pub struct LessonPlanRequest {
    pub subject: String,
    pub topic: String,
    pub grade: Grade,
    pub level: Proficiency,
    pub duration: LessonDuration,
}

impl LessonPlanRequest {
    /// 结果标题，例如 `Lesson Plan: Mathematics - addition for 3rd Grade (Beginner)`
    pub fn heading(&self) -> String {
        format!(
            "Lesson Plan: {} - {} for {} Grade ({})",
            self.subject, self.topic, self.grade, self.level
        )
    }
}
