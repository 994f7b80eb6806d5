use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Chinese,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKey {
    SiteTitle,
    SceneView,
    GridView,
    Loading,
    NotesLoadFailed,
    Tags,
    Category,
    NoDescription,
    CloseHint,
    ContactTitle,
    ContactName,
    ContactEmail,
    ContactMessage,
    ContactSent,
    ContactFailed,
    Help,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Chinese => "zh",
        }
    }

    pub fn text(self, key: TextKey) -> &'static str {
        match self {
            Language::English => english(key),
            Language::Chinese => chinese(key),
        }
    }

    pub fn notes_load_failed(self) -> &'static str {
        self.text(TextKey::NotesLoadFailed)
    }
}

fn english(key: TextKey) -> &'static str {
    match key {
        TextKey::SiteTitle => "Bookshelf",
        TextKey::SceneView => "Shelf",
        TextKey::GridView => "Grid",
        TextKey::Loading => "Loading notes...",
        TextKey::NotesLoadFailed => "Failed to load notes. Please try again later.",
        TextKey::Tags => "Tags",
        TextKey::Category => "Category",
        TextKey::NoDescription => "No description.",
        TextKey::CloseHint => "Esc close  ←/→ previous/next  ↑/↓ scroll",
        TextKey::ContactTitle => "Get in touch",
        TextKey::ContactName => "Name",
        TextKey::ContactEmail => "Email",
        TextKey::ContactMessage => "Message",
        TextKey::ContactSent => "Message sent. Thanks!",
        TextKey::ContactFailed => "Could not send message",
        TextKey::Help => "Help",
    }
}

fn chinese(key: TextKey) -> &'static str {
    match key {
        TextKey::SiteTitle => "书架",
        TextKey::SceneView => "书架视图",
        TextKey::GridView => "网格视图",
        TextKey::Loading => "笔记加载中...",
        TextKey::NotesLoadFailed => "笔记加载失败，请稍后重试。",
        TextKey::Tags => "标签",
        TextKey::Category => "分类",
        TextKey::NoDescription => "暂无简介。",
        TextKey::CloseHint => "Esc 关闭  ←/→ 上一本/下一本  ↑/↓ 滚动",
        TextKey::ContactTitle => "联系我",
        TextKey::ContactName => "姓名",
        TextKey::ContactEmail => "邮箱",
        TextKey::ContactMessage => "留言",
        TextKey::ContactSent => "留言已发送，谢谢！",
        TextKey::ContactFailed => "留言发送失败",
        TextKey::Help => "帮助",
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Language {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "zh" | "chinese" => Ok(Language::Chinese),
            _ => Err("unknown language"),
        }
    }
}
