//! 提示目录：字段路径到通俗解释的静态映射。
//!
//! 只有出现在目录中的字段才会被向导展示；其余字段一律不显示、不改动。
//! 目录由维护者在源码里编写，运行期只读。

/// 目录节点：叶子是一条解释文本，小节是下一层的键值表。
#[derive(Debug)]
pub enum CatalogNode {
    Leaf(&'static str),
    Section(&'static [(&'static str, CatalogNode)]),
}

impl CatalogNode {
    /// 在小节里按键查找；叶子节点查任何键都得到 `None`。
    pub fn get(&self, key: &str) -> Option<&CatalogNode> {
        match self {
            Self::Leaf(_) => None,
            Self::Section(entries) => entries.iter().find(|(k, _)| *k == key).map(|(_, v)| v),
        }
    }

    pub fn explain(&self) -> Option<&'static str> {
        match self {
            Self::Leaf(text) => Some(text),
            Self::Section(_) => None,
        }
    }
}

use CatalogNode::{Leaf, Section};

/// `bot_config.toml` 的提示目录。
pub fn bot_config_catalog() -> &'static CatalogNode {
    &BOT_CONFIG
}

static BOT_CONFIG: CatalogNode = Section(&[
    (
        "database",
        Section(&[(
            "database_type",
            Leaf("你想用哪种数据库？'sqlite' 就像个便签本，简单方便；'mysql' 则像个大书柜，适合管理大量数据。"),
        )]),
    ),
    (
        "permission",
        Section(&[(
            "master_users",
            Leaf("在这里填上你的 QQ 号，你就是这台 Bot 的最高指挥官！"),
        )]),
    ),
    (
        "bot",
        Section(&[
            ("qq_account", Leaf("Bot 要用哪个 QQ 号登录？填在这里。")),
            ("nickname", Leaf("给你的 Bot 起个好听的名字吧！")),
            (
                "alias_names",
                Leaf("再给 Bot 起几个小名，方便大家称呼。多个用逗号或空格隔开。"),
            ),
        ]),
    ),
    (
        "personality",
        Section(&[
            (
                "personality_core",
                Leaf("一句话描述 Bot 的核心性格，比如\u{201c}一个傲娇的猫娘\u{201d}。"),
            ),
            (
                "identity",
                Leaf("详细描述一下 Bot 的设定，比如年龄、性别、外貌等等。"),
            ),
            (
                "background_story",
                Leaf("如果你想给 Bot 设定更复杂的背景故事，可以在这里写。"),
            ),
            (
                "reply_style",
                Leaf("定义 Bot 的说话风格，让它更符合你的想象。"),
            ),
        ]),
    ),
    (
        "expression",
        Section(&[
            (
                "use_expression",
                Leaf("是否让 Bot 学习并使用新的说话方式？填 true 或 false。"),
            ),
            (
                "learn_expression",
                Leaf("是否允许 Bot 从聊天中学习新的表达方式？填 true 或 false。"),
            ),
        ]),
    ),
    (
        "chat",
        Section(&[
            (
                "group_chat_mode",
                Leaf("在群里,Bot 应该是什么样的聊天模式?'auto' - 智能切换,'normal' - 普通模式,'focus' - 专注模式。"),
            ),
            (
                "talk_frequency",
                Leaf("调整 Bot 的话痨程度,数值越高,它就越活跃。"),
            ),
            (
                "enable_proactive_thinking",
                Leaf("是否允许 Bot 在没人理它的时候主动找话题? 填 true 或 false。"),
            ),
            (
                "proactive_thinking_interval",
                Leaf("Bot 主动思考一次后,大概要等多久(秒)才会再次主动思考?"),
            ),
            (
                "proactive_thinking_enable_in_private",
                Leaf("在这里添加允许 Bot 主动思考的私聊 QQ 号(多个用逗号或空格隔开)。"),
            ),
            (
                "proactive_thinking_enable_in_groups",
                Leaf("在这里添加允许 Bot 主动思考的QQ群号(多个用逗号或空格隔开)。"),
            ),
        ]),
    ),
    (
        "anti_prompt_injection",
        Section(&[(
            "enabled",
            Leaf("是否开启防御模式，防止别人对你的 Bot 进行\u{201c}催眠\u{201d}或\u{201c}洗脑\u{201d}？填 true 或 false。(但是会拖慢消息处理速度)"),
        )]),
    ),
    (
        "mood",
        Section(&[(
            "enable_mood",
            Leaf("是否让 Bot 拥有自己的情绪？开启后，它的心情会根据聊天内容变化。填 true 或 false。"),
        )]),
    ),
    (
        "emoji",
        Section(&[
            (
                "emoji_chance",
                Leaf("Bot 有多大的概率会发表情包？(0.0 到 1.0 之间的小数)"),
            ),
            (
                "steal_emoji",
                Leaf("是否允许 Bot\u{201c}偷\u{201d}群友的表情包自己用？填 true 或 false。"),
            ),
        ]),
    ),
    (
        "memory",
        Section(&[(
            "enable_memory",
            Leaf("是否让 Bot 拥有记忆力，能记住和大家的聊天内容？填 true 或 false。"),
        )]),
    ),
    (
        "web_search",
        Section(&[
            (
                "enable_web_search_tool",
                Leaf("是否允许 Bot 上网查资料？填 true 或 false。"),
            ),
            (
                "enabled_engines",
                Leaf("你想启用哪些搜索引擎？可选 'ddg', 'bing', 'exa', 'tavily'。多个用逗号隔开。"),
            ),
            (
                "tavily_api_keys",
                Leaf("如果你要用 Tavily，在这里填上你的 API Key。多个 Key 用逗号或空格隔开。"),
            ),
            (
                "exa_api_keys",
                Leaf("同上，这是 EXA 搜索引擎的 API Key。多个 Key 用逗号或空格隔开。"),
            ),
        ]),
    ),
    (
        "planning_system",
        Section(&[
            (
                "schedule_enable",
                Leaf("是否让 Bot 每天自动生成日程表？填 true 或 false。"),
            ),
            (
                "monthly_plan_enable",
                Leaf("是否让 Bot 每月自动生成计划？填 true 或 false。"),
            ),
        ]),
    ),
    (
        "sleep_system",
        Section(&[
            (
                "enable",
                Leaf("是否启用睡眠系统？开启后 Bot 会在指定时间\u{201c}睡觉\u{201d}，期间不会回复。填 true 或 false。"),
            ),
            (
                "sleep_by_schedule",
                Leaf("是严格按照日程表的时间睡觉，还是使用下面固定的时间？填 true 或 false。"),
            ),
            (
                "fixed_sleep_time",
                Leaf("如果不用日程表，Bot 每天几点睡觉？格式：HH:MM，例如 '23:00'。"),
            ),
            (
                "fixed_wake_up_time",
                Leaf("如果不用日程表，Bot 每天几点起床？格式：HH:MM，例如 '07:00'。"),
            ),
        ]),
    ),
    (
        "cross_context",
        Section(&[(
            "name",
            Leaf("给这个跨群共享组起个名字，方便你自己辨认。"),
        )]),
    ),
]);
