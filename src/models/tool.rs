//! 工具菜单

use serde::Serialize;

/// 三个互斥的工具
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Tool {
    LessonPlan,
    TestQuestions,
    HelpStudents,
}

impl Tool {
    pub const ALL: [Tool; 3] = [Tool::LessonPlan, Tool::TestQuestions, Tool::HelpStudents];

    pub fn label(self) -> &'static str {
        match self {
            Tool::LessonPlan => "Generate Lesson Plan",
            Tool::TestQuestions => "Create Test Questions",
            Tool::HelpStudents => "Help Students",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Tool::LessonPlan => "/lesson-plan",
            Tool::TestQuestions => "/test-questions",
            Tool::HelpStudents => "/help",
        }
    }
}

/// 菜单项（模板上下文）
#[derive(Debug, Clone, Serialize)]
pub struct MenuEntry {
    pub label: &'static str,
    pub path: &'static str,
    pub active: bool,
}

/// 生成侧边栏菜单，`current` 为当前所在工具
pub fn menu(current: Option<Tool>) -> Vec<MenuEntry> {
    Tool::ALL
        .into_iter()
        .map(|tool| MenuEntry {
            label: tool.label(),
            path: tool.path(),
            active: Some(tool) == current,
        })
        .collect()
}
