//! 交互式设置编辑器。
//!
//! 按文档自身的键顺序遍历设置文档，对每个同时出现在提示目录里的字段：
//! 展示解释文本和当前值，读取一行输入，按字段"现有值"的类型转换并写回，
//! 同时把解释文本合并进该字段的行内注释。空输入一律表示"保持不变"。
//!
//! 规则列表、共享组列表这类可重复小节由按小节名注册的策略对象接管，
//! 单个字段的转换失败只跳过该字段，绝不中断整个遍历。

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input};
use std::collections::BTreeSet;
use thiserror::Error;
use toml_edit::{value, Array, Item, RawString, Table, Value};

use super::catalog::CatalogNode;

// ── 输入来源 ─────────────────────────────────────────────────────

/// 向导的输入来源。控制台实现走 dialoguer，测试用脚本化实现。
pub trait Prompter {
    /// 读取一行文本，允许为空。
    fn input(&mut self, prompt: &str) -> Result<String>;
    /// 读取一个是/否回答。
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool>;
}

/// 基于 dialoguer 的控制台输入。
pub struct ConsolePrompter;

impl Prompter for ConsolePrompter {
    fn input(&mut self, prompt: &str) -> Result<String> {
        Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .context("读取输入失败")
    }

    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool> {
        Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()
            .context("读取输入失败")
    }
}

/// 按预先写好的回答序列作答，供测试与脚本化场景使用。
pub struct ScriptedPrompter {
    replies: std::collections::VecDeque<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: replies.into_iter().map(Into::into).collect(),
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn input(&mut self, _prompt: &str) -> Result<String> {
        self.replies
            .pop_front()
            .context("脚本化回答已耗尽")
    }

    fn confirm(&mut self, _prompt: &str, default: bool) -> Result<bool> {
        let raw = self.replies.pop_front().context("脚本化回答已耗尽")?;
        let raw = raw.trim().to_lowercase();
        if raw.is_empty() {
            return Ok(default);
        }
        Ok(matches!(raw.as_str(), "y" | "yes" | "true" | "1"))
    }
}

// ── 字段类型与转换 ───────────────────────────────────────────────

/// 转换失败。字段名由调用方补充到报错输出里。
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("无法解析为整数：{0}")]
    Int(String),
    #[error("无法解析为浮点数：{0}")]
    Float(String),
}

/// 叶子字段的类型标签，由"现有值"分类得出。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Bool,
    Int,
    Float,
    Str,
    StrList,
}

impl FieldKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Boolean(_) => Self::Bool,
            Value::Integer(_) => Self::Int,
            Value::Float(_) => Self::Float,
            Value::Array(_) => Self::StrList,
            _ => Self::Str,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Bool => "布尔值(bool)",
            Self::Int => "整数(int)",
            Self::Float => "浮点数(float)",
            Self::Str => "字符串(str)",
            Self::StrList => "字符串列表(list)",
        }
    }

    /// 按类型标签把一行输入转换成新值。
    pub fn convert(self, raw: &str) -> Result<Value, ConvertError> {
        match self {
            Self::Bool => Ok(convert_bool(raw)),
            Self::Int => convert_int(raw),
            Self::Float => convert_float(raw),
            Self::Str => Ok(Value::from(raw)),
            Self::StrList => Ok(convert_list(raw)),
        }
    }
}

/// 认作"真"的输入词表，其余非空输入一律视为"假"。
const TRUTHY: &[&str] = &["true", "1", "t", "y", "yes"];

fn convert_bool(raw: &str) -> Value {
    Value::from(TRUTHY.contains(&raw.to_lowercase().as_str()))
}

fn convert_int(raw: &str) -> Result<Value, ConvertError> {
    raw.parse::<i64>()
        .map(Value::from)
        .map_err(|_| ConvertError::Int(raw.to_string()))
}

fn convert_float(raw: &str) -> Result<Value, ConvertError> {
    raw.parse::<f64>()
        .map(Value::from)
        .map_err(|_| ConvertError::Float(raw.to_string()))
}

fn convert_list(raw: &str) -> Value {
    Value::Array(Array::from_iter(split_tokens(raw)))
}

/// 按逗号/空白的连续串切分，去掉首尾空白和空片段。
pub fn split_tokens(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

// ── 列表合并 ─────────────────────────────────────────────────────

/// 累加式列表字段：新 ID 与现有列表做并集，排序去重；
/// 裸 ID 会补上固定的命名空间前缀（如 `qq:`）。
pub fn merge_accumulator(existing: &Array, raw: &str, prefix: Option<&str>) -> Array {
    let mut set: BTreeSet<String> = existing
        .iter()
        .filter_map(Value::as_str)
        .map(String::from)
        .collect();
    for token in split_tokens(raw) {
        let entry = match prefix {
            Some(p) if !token.starts_with(p) => format!("{p}{token}"),
            _ => token,
        };
        set.insert(entry);
    }
    Array::from_iter(set)
}

/// 主人字段：输入恒定包装成一条 `[tag, id]` 对，追加到现有列表并去重。
/// 合并语义允许多个主人并存，这是有意的设计。
pub fn merge_owner_pairs(existing: Option<&Array>, tag: &str, raw: &str) -> Array {
    let mut pairs: Vec<(String, String)> = existing
        .iter()
        .flat_map(|arr| arr.iter())
        .filter_map(Value::as_array)
        .filter_map(|pair| {
            let tag = pair.get(0).and_then(Value::as_str)?;
            let id = pair.get(1).and_then(Value::as_str)?;
            Some((tag.to_string(), id.to_string()))
        })
        .collect();

    let incoming = (tag.to_string(), raw.to_string());
    if !pairs.contains(&incoming) {
        pairs.push(incoming);
    }

    let mut result = Array::new();
    for (tag, id) in pairs {
        let mut pair = Array::new();
        pair.push(tag);
        pair.push(id);
        result.push(Value::Array(pair));
    }
    result
}

/// 共享组成员：`平台:ID` 形式的标记串，裸 ID 默认归入 `qq` 平台，
/// 与现有成员做并集后按标签排序。只增不删。
pub fn merge_tagged_members(existing: &Array, raw: &str) -> Array {
    let mut set: BTreeSet<String> = existing
        .iter()
        .filter_map(Value::as_str)
        .map(String::from)
        .collect();
    for token in split_tokens(raw) {
        set.insert(normalize_tagged(&token));
    }
    Array::from_iter(set)
}

fn normalize_tagged(token: &str) -> String {
    match token.split_once(':') {
        Some((tag, id)) => format!("{}:{}", tag.trim(), id.trim()),
        None => format!("qq:{token}"),
    }
}

// ── 行内注释 ─────────────────────────────────────────────────────

/// 把解释文本合并进值的行内注释：已有注释追加而不覆盖，
/// 相同文本已存在时不再重复添加。
pub fn update_comment(value: &mut Value, text: &str) {
    if text.is_empty() {
        return;
    }
    let decor = value.decor_mut();
    let existing = decor
        .suffix()
        .and_then(RawString::as_str)
        .unwrap_or("")
        .to_string();
    let existing_text = existing.trim_start().trim_start_matches('#').trim();

    if existing_text.contains(text) {
        return;
    }
    let merged = if existing_text.is_empty() {
        format!(" # {text}")
    } else {
        format!(" # {existing_text} | {text}")
    };
    decor.set_suffix(merged);
}

// ── 叶子字段的特殊角色 ───────────────────────────────────────────

/// 累加式 ID 列表字段及其命名空间前缀。
const ACCUMULATOR_FIELDS: &[(&str, &str)] = &[
    ("proactive_thinking_enable_in_private", "qq:"),
    ("proactive_thinking_enable_in_groups", "qq:"),
];

/// 主人字段：恒定写成 `[[tag, id]]` 的列表。
const OWNER_FIELD: &str = "master_users";

enum LeafRole {
    Plain,
    Accumulator(&'static str),
    OwnerPairs(&'static str),
}

fn role_for(key: &str) -> LeafRole {
    if key == OWNER_FIELD {
        return LeafRole::OwnerPairs("qq");
    }
    if let Some((_, prefix)) = ACCUMULATOR_FIELDS.iter().find(|(k, _)| *k == key) {
        return LeafRole::Accumulator(prefix);
    }
    LeafRole::Plain
}

// ── 小节策略 ─────────────────────────────────────────────────────

/// 可重复记录小节的定制编辑行为，按小节名注册。
pub trait SectionStrategy: Sync {
    /// 该小节当前是否需要定制处理（触发键缺失时回退到通用遍历）。
    fn applies(&self, table: &Table) -> bool;
    fn edit(
        &self,
        editor: &mut SettingsEditor<'_>,
        table: &mut Table,
        catalog: &CatalogNode,
    ) -> Result<()>;
}

/// `[expression]` 的表达学习规则列表。
struct ExpressionRules;

impl SectionStrategy for ExpressionRules {
    fn applies(&self, table: &Table) -> bool {
        table.contains_key("rules")
    }

    fn edit(
        &self,
        editor: &mut SettingsEditor<'_>,
        table: &mut Table,
        catalog: &CatalogNode,
    ) -> Result<()> {
        println!("\n--- 正在配置 [expression] (表达学习规则) ---");
        let Some(rules) = table.get_mut("rules").and_then(Item::as_array_of_tables_mut) else {
            return Ok(());
        };

        for (index, rule) in rules.iter_mut().enumerate() {
            let rule_id = rule
                .get("chat_stream_id")
                .and_then(Item::as_str)
                .unwrap_or("全局规则")
                .to_string();
            println!("\n--- 编辑规则 {}: {rule_id} ---", index + 1);
            editor.edit_record(rule, catalog)?;
        }

        loop {
            let add = editor
                .prompter
                .confirm("是否要为特定群聊或私聊添加新的表达学习规则?", false)?;
            if !add {
                break;
            }
            let chat_id = editor.prompter.input("请输入群号或私聊 QQ 号")?;
            let chat_id = chat_id.trim().to_string();
            let chat_type = editor
                .prompter
                .input("请输入类型 (group/private)")?
                .trim()
                .to_lowercase();
            if chat_id.is_empty() || !matches!(chat_type.as_str(), "group" | "private") {
                println!("{}", style("输入无效，请重新输入。").red());
                continue;
            }
            let mut rule = Table::new();
            rule.insert(
                "chat_stream_id",
                value(format!("qq:{chat_id}:{chat_type}")),
            );
            rule.insert("use_expression", value(true));
            rule.insert("learn_expression", value(true));
            rules.push(rule);
            println!("已为 qq:{chat_id}:{chat_type} 添加新规则，默认启用学习和使用。");
        }
        Ok(())
    }
}

/// `[cross_context]` 的跨群共享组列表。成员只增不删。
struct CrossContextGroups;

impl SectionStrategy for CrossContextGroups {
    fn applies(&self, table: &Table) -> bool {
        table.contains_key("groups")
    }

    fn edit(
        &self,
        editor: &mut SettingsEditor<'_>,
        table: &mut Table,
        catalog: &CatalogNode,
    ) -> Result<()> {
        println!("\n--- 正在配置 [cross_context] (跨群共享组) ---");
        let Some(groups) = table.get_mut("groups").and_then(Item::as_array_of_tables_mut) else {
            return Ok(());
        };

        for group in groups.iter_mut() {
            let name = group
                .get("name")
                .and_then(Item::as_str)
                .unwrap_or("未命名组")
                .to_string();
            println!("\n--- 编辑共享组: {name} ---");
            editor.edit_record(group, catalog)?;
            edit_group_members(editor, group)?;
        }

        loop {
            let add = editor.prompter.confirm("是否要添加新的共享组?", false)?;
            if !add {
                break;
            }
            let name = editor.prompter.input("请输入共享组名称")?;
            let name = name.trim().to_string();
            if name.is_empty() {
                println!("{}", style("输入无效，请重新输入。").red());
                continue;
            }
            let raw = editor
                .prompter
                .input("请输入初始成员 (格式 平台:ID, 多个用逗号或空格隔开, 可留空)")?;
            let mut group = Table::new();
            group.insert("name", value(&name));
            group.insert(
                "members",
                Item::Value(Value::Array(merge_tagged_members(&Array::new(), raw.trim()))),
            );
            groups.push(group);
            println!("已添加共享组 {name}。");
        }
        Ok(())
    }
}

fn edit_group_members(editor: &mut SettingsEditor<'_>, group: &mut Table) -> Result<()> {
    let current = group
        .get("members")
        .map(display_item)
        .unwrap_or_else(|| "[]".to_string());
    println!("   当前成员：{current}");
    let raw = editor
        .prompter
        .input("   请输入要添加的成员 (格式 平台:ID, 多个用逗号或空格隔开, 直接回车则不添加)")?;
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(());
    }
    let merged = match group
        .get("members")
        .and_then(Item::as_value)
        .and_then(Value::as_array)
    {
        Some(existing) => merge_tagged_members(existing, raw),
        None => merge_tagged_members(&Array::new(), raw),
    };
    set_value_preserving(group, "members", Value::Array(merged));
    if let Some(updated) = group.get("members") {
        println!("   成员已更新为: {}", display_item(updated));
    }
    Ok(())
}

static STRATEGIES: &[(&str, &(dyn SectionStrategy))] = &[
    ("expression", &ExpressionRules),
    ("cross_context", &CrossContextGroups),
];

fn strategy_for(section: &str) -> Option<&'static dyn SectionStrategy> {
    STRATEGIES
        .iter()
        .find(|(key, _)| *key == section)
        .map(|(_, s)| *s)
}

// ── 编辑器主体 ───────────────────────────────────────────────────

/// 遍历设置文档并逐字段询问用户的编辑器。
/// 只做内存中的修改，持久化由调用方在遍历结束后完成。
pub struct SettingsEditor<'a> {
    prompter: &'a mut dyn Prompter,
}

impl<'a> SettingsEditor<'a> {
    pub fn new(prompter: &'a mut dyn Prompter) -> Self {
        Self { prompter }
    }

    /// 编辑整个文档。遍历顺序跟随文档自身的键顺序。
    pub fn edit_document(&mut self, doc: &mut Table, catalog: &CatalogNode) -> Result<()> {
        self.edit_table(None, doc, catalog)
    }

    fn edit_table(
        &mut self,
        section: Option<&str>,
        table: &mut Table,
        catalog: &CatalogNode,
    ) -> Result<()> {
        if let Some(name) = section {
            if let Some(strategy) = strategy_for(name) {
                if strategy.applies(table) {
                    return strategy.edit(self, table, catalog);
                }
            }
        }

        let keys: Vec<String> = table.iter().map(|(k, _)| k.to_string()).collect();
        for key in keys {
            let Some(item) = table.get(&key) else { continue };
            if item.is_table() {
                if let Some(sub_catalog @ CatalogNode::Section(_)) = catalog.get(&key) {
                    println!("\n--- 正在配置 [{key}] 部分 ---");
                    let Some(sub_table) = table.get_mut(&key).and_then(Item::as_table_mut) else {
                        continue;
                    };
                    self.edit_table(Some(&key), sub_table, sub_catalog)?;
                }
            } else if item.is_value() {
                if let Some(CatalogNode::Leaf(explain)) = catalog.get(&key) {
                    self.edit_leaf(table, &key, explain)?;
                }
            }
            // 不在目录里的键（含数组表）一律静默跳过
        }
        Ok(())
    }

    /// 编辑一条记录（规则、共享组）里出现在目录中的叶子字段。
    fn edit_record(&mut self, record: &mut Table, catalog: &CatalogNode) -> Result<()> {
        let keys: Vec<String> = record.iter().map(|(k, _)| k.to_string()).collect();
        for key in keys {
            if let Some(CatalogNode::Leaf(explain)) = catalog.get(&key) {
                self.edit_leaf(record, &key, explain)?;
            }
        }
        Ok(())
    }

    /// 编辑单个叶子字段：展示、询问、转换、写回、合并注释。
    pub fn edit_leaf(&mut self, table: &mut Table, key: &str, explain: &str) -> Result<()> {
        let current = table.get(key).map(display_item).unwrap_or_default();
        println!("-> 正在配置 '{key}':");
        println!("   说明：{explain}");
        println!("   当前值：{current}");

        match role_for(key) {
            LeafRole::Accumulator(prefix) => {
                let raw = self
                    .prompter
                    .input("   请输入要添加的新 ID (多个用逗号或空格隔开, 直接回车则不添加)")?;
                let raw = raw.trim();
                if !raw.is_empty() {
                    let merged = match table
                        .get(key)
                        .and_then(Item::as_value)
                        .and_then(Value::as_array)
                    {
                        Some(existing) => merge_accumulator(existing, raw, Some(prefix)),
                        None => merge_accumulator(&Array::new(), raw, Some(prefix)),
                    };
                    set_value_preserving(table, key, Value::Array(merged));
                    self.report_updated(table, key);
                }
            }
            LeafRole::OwnerPairs(tag) => {
                let raw = self.prompter.input("   请输入新值 (直接回车则不修改)")?;
                let raw = raw.trim();
                if !raw.is_empty() {
                    let existing = table
                        .get(key)
                        .and_then(Item::as_value)
                        .and_then(Value::as_array);
                    let merged = merge_owner_pairs(existing, tag, raw);
                    set_value_preserving(table, key, Value::Array(merged));
                    self.report_updated(table, key);
                }
            }
            LeafRole::Plain => {
                let raw = self.prompter.input("   请输入新值 (直接回车则不修改)")?;
                let raw = raw.trim();
                if !raw.is_empty() {
                    let Some(old) = table.get(key).and_then(Item::as_value) else {
                        return Ok(());
                    };
                    let kind = FieldKind::of(old);
                    match kind.convert(raw) {
                        Ok(new_value) => {
                            set_value_preserving(table, key, new_value);
                            self.report_updated(table, key);
                        }
                        Err(err) => {
                            println!(
                                "{}",
                                style(format!(
                                    "   输入格式错误或转换失败！'{key}' 的值类型应为 {}。{err}。跳过此项。",
                                    kind.label()
                                ))
                                .red()
                            );
                        }
                    }
                }
            }
        }

        if let Some(value) = table.get_mut(key).and_then(Item::as_value_mut) {
            update_comment(value, explain);
        }
        Ok(())
    }

    fn report_updated(&self, table: &Table, key: &str) {
        if let Some(updated) = table.get(key) {
            println!("   '{key}' 已更新为: {}", display_item(updated));
        }
    }
}

/// 替换表中的值，保留原值的前后缀修饰（缩进与行内注释）。
fn set_value_preserving(table: &mut Table, key: &str, mut new_value: Value) {
    let (prefix, suffix) = table
        .get(key)
        .and_then(Item::as_value)
        .map(|old| {
            let decor = old.decor();
            (
                decor
                    .prefix()
                    .and_then(RawString::as_str)
                    .map(str::to_string),
                decor
                    .suffix()
                    .and_then(RawString::as_str)
                    .map(str::to_string),
            )
        })
        .unwrap_or((None, None));

    let decor = new_value.decor_mut();
    decor.set_prefix(prefix.unwrap_or_else(|| " ".to_string()));
    if let Some(suffix) = suffix {
        decor.set_suffix(suffix);
    }
    table.insert(key, Item::Value(new_value));
}

fn display_item(item: &Item) -> String {
    if let Some(value) = item.as_value() {
        let mut bare = value.clone();
        bare.decor_mut().clear();
        bare.to_string().trim().to_string()
    } else {
        item.to_string().trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toml_edit::DocumentMut;

    fn edit_with(doc: &str, replies: &[&str]) -> DocumentMut {
        let mut document = doc.parse::<DocumentMut>().expect("测试文档应能解析");
        let mut prompter = ScriptedPrompter::new(replies.iter().copied());
        let mut editor = SettingsEditor::new(&mut prompter);
        editor
            .edit_document(&mut document, super::super::catalog::bot_config_catalog())
            .expect("编辑不应失败");
        document
    }

    // ── 转换 ──

    #[test]
    fn truthy_vocabulary_converts_to_true() {
        for raw in ["yes", "Y", "true", "1", "t"] {
            let v = FieldKind::Bool.convert(raw).unwrap();
            assert_eq!(v.as_bool(), Some(true), "{raw} 应转换为 true");
        }
    }

    #[test]
    fn other_non_empty_input_converts_to_false() {
        for raw in ["no", "false", "0", "随便"] {
            let v = FieldKind::Bool.convert(raw).unwrap();
            assert_eq!(v.as_bool(), Some(false), "{raw} 应转换为 false");
        }
    }

    #[test]
    fn numeric_conversion_errors_on_garbage() {
        assert!(matches!(
            FieldKind::Int.convert("abc"),
            Err(ConvertError::Int(_))
        ));
        assert!(matches!(
            FieldKind::Float.convert("abc"),
            Err(ConvertError::Float(_))
        ));
        assert_eq!(FieldKind::Int.convert("42").unwrap().as_integer(), Some(42));
        assert_eq!(
            FieldKind::Float.convert("0.5").unwrap().as_float(),
            Some(0.5)
        );
    }

    #[test]
    fn split_tokens_handles_mixed_separators() {
        assert_eq!(split_tokens("a, b  c"), vec!["a", "b", "c"]);
        assert_eq!(split_tokens("  ,, "), Vec::<String>::new());
    }

    #[test]
    fn field_kind_classifies_from_current_value() {
        let doc = "b = true\ni = 1\nf = 1.5\ns = \"x\"\nl = [\"a\"]\n"
            .parse::<DocumentMut>()
            .unwrap();
        let kind_of = |key: &str| {
            FieldKind::of(doc.get(key).and_then(Item::as_value).unwrap())
        };
        assert_eq!(kind_of("b"), FieldKind::Bool);
        assert_eq!(kind_of("i"), FieldKind::Int);
        assert_eq!(kind_of("f"), FieldKind::Float);
        assert_eq!(kind_of("s"), FieldKind::Str);
        assert_eq!(kind_of("l"), FieldKind::StrList);
    }

    // ── 合并 ──

    #[test]
    fn accumulator_merges_sorted_and_deduplicated() {
        let existing = Array::from_iter(["b"]);
        let merged = merge_accumulator(&existing, "a, b  c", None);
        let items: Vec<_> = merged.iter().filter_map(Value::as_str).collect();
        assert_eq!(items, vec!["a", "b", "c"]);
    }

    #[test]
    fn accumulator_applies_namespace_prefix_once() {
        let existing = Array::from_iter(["qq:100"]);
        let merged = merge_accumulator(&existing, "200 qq:300", Some("qq:"));
        let items: Vec<_> = merged.iter().filter_map(Value::as_str).collect();
        assert_eq!(items, vec!["qq:100", "qq:200", "qq:300"]);
    }

    #[test]
    fn owner_pairs_append_and_deduplicate() {
        let first = merge_owner_pairs(None, "qq", "12345");
        assert_eq!(first.len(), 1);

        let second = merge_owner_pairs(Some(&first), "qq", "67890");
        assert_eq!(second.len(), 2);

        let third = merge_owner_pairs(Some(&second), "qq", "12345");
        assert_eq!(third.len(), 2, "重复主人不应再次追加");

        let pair = third.get(0).and_then(Value::as_array).unwrap();
        assert_eq!(pair.get(0).and_then(Value::as_str), Some("qq"));
        assert_eq!(pair.get(1).and_then(Value::as_str), Some("12345"));
    }

    #[test]
    fn tagged_members_merge_sorted_by_tag() {
        let existing = Array::from_iter(["qq:200"]);
        let merged = merge_tagged_members(&existing, "discord:9, 100 qq:200");
        let items: Vec<_> = merged.iter().filter_map(Value::as_str).collect();
        assert_eq!(items, vec!["discord:9", "qq:100", "qq:200"]);
    }

    // ── 注释 ──

    #[test]
    fn update_comment_appends_and_never_duplicates() {
        let mut doc = "nickname = \"墨狐\" # 原有注释\n".parse::<DocumentMut>().unwrap();
        let value = doc
            .get_mut("nickname")
            .and_then(Item::as_value_mut)
            .unwrap();
        update_comment(value, "给你的 Bot 起个好听的名字吧！");
        update_comment(value, "给你的 Bot 起个好听的名字吧！");

        let rendered = doc.to_string();
        assert!(rendered.contains("原有注释"));
        assert!(rendered.contains("给你的 Bot 起个好听的名字吧！"));
        assert_eq!(rendered.matches("好听的名字").count(), 1);
    }

    // ── 遍历 ──

    #[test]
    fn empty_input_leaves_values_unchanged() {
        let doc = edit_with(
            "[bot]\nqq_account = 10000\nnickname = \"墨狐\"\nalias_names = [\"小狐\"]\n",
            &["", "", ""],
        );
        assert_eq!(doc["bot"]["qq_account"].as_integer(), Some(10000));
        assert_eq!(doc["bot"]["nickname"].as_str(), Some("墨狐"));
        let aliases: Vec<_> = doc["bot"]["alias_names"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(aliases, vec!["小狐"]);
    }

    #[test]
    fn nickname_edit_attaches_catalog_comment() {
        let doc = edit_with("[bot]\nnickname = \"Old\"\n", &["New"]);
        assert_eq!(doc["bot"]["nickname"].as_str(), Some("New"));
        assert!(doc.to_string().contains("给你的 Bot 起个好听的名字吧！"));
    }

    #[test]
    fn bad_numeric_input_keeps_previous_value() {
        let doc = edit_with("[chat]\nproactive_thinking_interval = 300\n", &["abc"]);
        assert_eq!(
            doc["chat"]["proactive_thinking_interval"].as_integer(),
            Some(300)
        );
    }

    #[test]
    fn unlisted_fields_are_never_touched() {
        let doc = edit_with(
            "[bot]\nnickname = \"Old\"\nsecret_internal = \"勿动\"\n",
            &["New"],
        );
        assert_eq!(doc["bot"]["secret_internal"].as_str(), Some("勿动"));
    }

    #[test]
    fn accumulator_field_merges_with_prefix() {
        let doc = edit_with(
            "[chat]\nproactive_thinking_enable_in_private = [\"qq:100\"]\n",
            &["200, 300"],
        );
        let ids: Vec<_> = doc["chat"]["proactive_thinking_enable_in_private"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(ids, vec!["qq:100", "qq:200", "qq:300"]);
    }

    #[test]
    fn master_users_builds_tagged_pair_list() {
        let doc = edit_with("[permission]\nmaster_users = []\n", &["12345"]);
        let owners = doc["permission"]["master_users"].as_array().unwrap();
        assert_eq!(owners.len(), 1);
        let pair = owners.get(0).and_then(Value::as_array).unwrap();
        assert_eq!(pair.get(0).and_then(Value::as_str), Some("qq"));
        assert_eq!(pair.get(1).and_then(Value::as_str), Some("12345"));
    }

    #[test]
    fn declining_new_rule_keeps_list_length() {
        let doc = edit_with(
            concat!(
                "[[expression.rules]]\n",
                "chat_stream_id = \"qq:100:group\"\n",
                "use_expression = true\n",
                "learn_expression = true\n",
            ),
            // 规则内两个叶子字段各留空一次，然后拒绝添加新规则
            &["", "", "n"],
        );
        let rules = doc["expression"]["rules"].as_array_of_tables().unwrap();
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn accepting_new_rule_appends_with_defaults() {
        let doc = edit_with(
            concat!(
                "[[expression.rules]]\n",
                "chat_stream_id = \"qq:100:group\"\n",
                "use_expression = true\n",
                "learn_expression = true\n",
            ),
            &["", "", "y", "200", "private", "n"],
        );
        let rules = doc["expression"]["rules"].as_array_of_tables().unwrap();
        assert_eq!(rules.len(), 2);
        let added = rules.iter().nth(1).unwrap();
        assert_eq!(
            added.get("chat_stream_id").and_then(Item::as_str),
            Some("qq:200:private")
        );
        assert_eq!(
            added.get("use_expression").and_then(Item::as_bool),
            Some(true)
        );
        assert_eq!(
            added.get("learn_expression").and_then(Item::as_bool),
            Some(true)
        );
    }

    #[test]
    fn group_members_are_add_only_and_sorted() {
        let doc = edit_with(
            concat!(
                "[[cross_context.groups]]\n",
                "name = \"姐妹群\"\n",
                "members = [\"qq:300\"]\n",
            ),
            // name 留空、添加成员、拒绝新组
            &["", "100 discord:5", "n"],
        );
        let groups = doc["cross_context"]["groups"].as_array_of_tables().unwrap();
        let members: Vec<_> = groups
            .iter()
            .next()
            .unwrap()
            .get("members")
            .and_then(Item::as_value)
            .and_then(Value::as_array)
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(members, vec!["discord:5", "qq:100", "qq:300"]);
    }

    #[test]
    fn new_group_is_appended_with_members() {
        let doc = edit_with(
            concat!(
                "[[cross_context.groups]]\n",
                "name = \"姐妹群\"\n",
                "members = [\"qq:300\"]\n",
            ),
            &["", "", "y", "新群", "qq:1 qq:2", "n"],
        );
        let groups = doc["cross_context"]["groups"].as_array_of_tables().unwrap();
        assert_eq!(groups.len(), 2);
        let added = groups.iter().nth(1).unwrap();
        assert_eq!(added.get("name").and_then(Item::as_str), Some("新群"));
    }

    #[test]
    fn zero_edit_round_trip_only_gains_catalog_comments() {
        let raw = concat!(
            "# 用户手写的顶部注释\n",
            "[bot]\n",
            "nickname = \"墨狐\" # 手写注释\n",
            "qq_account = 10000\n",
        );
        let doc = edit_with(raw, &["", ""]);
        let rendered = doc.to_string();
        assert!(rendered.contains("# 用户手写的顶部注释"));
        assert!(rendered.contains("手写注释"));
        assert_eq!(doc["bot"]["nickname"].as_str(), Some("墨狐"));
        assert_eq!(doc["bot"]["qq_account"].as_integer(), Some(10000));
    }
}
