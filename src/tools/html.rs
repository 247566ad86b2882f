//! HTML 字段提取
//!
//! 站内搜索结果（li.c-search-result-item）与新闻卡片（div.cards-container.bs_row 内的
//! c-cards-press-release__card-container）按 class 定位后取文本 / 属性；
//! 网页正文用 html2text 转为可读文本，失败时回退到简易去标签。

use std::sync::OnceLock;

use html2text::from_read;
use regex::{Captures, Regex};

use crate::tools::models::{NewsCard, SearchResult};

static LI_OPEN_RE: OnceLock<Regex> = OnceLock::new();
static A_RE: OnceLock<Regex> = OnceLock::new();
static H3_RE: OnceLock<Regex> = OnceLock::new();
static H4_RE: OnceLock<Regex> = OnceLock::new();
static SPAN_RE: OnceLock<Regex> = OnceLock::new();
static P_RE: OnceLock<Regex> = OnceLock::new();
static DIV_OPEN_RE: OnceLock<Regex> = OnceLock::new();
static IMG_RE: OnceLock<Regex> = OnceLock::new();
static ATTR_RE: OnceLock<Regex> = OnceLock::new();
static TAG_RE: OnceLock<Regex> = OnceLock::new();
static ENTITY_RE: OnceLock<Regex> = OnceLock::new();

/// 成对标签：捕获 (属性串, 内部 HTML)
fn element_re(tag: &str) -> Regex {
    Regex::new(&format!(r"(?is)<{tag}\b([^>]*)>(.*?)</{tag}\s*>")).unwrap()
}

fn li_open_re() -> &'static Regex {
    LI_OPEN_RE.get_or_init(|| Regex::new(r"(?is)<li\b([^>]*)>").unwrap())
}

fn a_re() -> &'static Regex {
    A_RE.get_or_init(|| element_re("a"))
}

fn h3_re() -> &'static Regex {
    H3_RE.get_or_init(|| element_re("h3"))
}

fn h4_re() -> &'static Regex {
    H4_RE.get_or_init(|| element_re("h4"))
}

fn span_re() -> &'static Regex {
    SPAN_RE.get_or_init(|| element_re("span"))
}

fn p_re() -> &'static Regex {
    P_RE.get_or_init(|| element_re("p"))
}

fn div_open_re() -> &'static Regex {
    DIV_OPEN_RE.get_or_init(|| Regex::new(r"(?is)<div\b([^>]*)>").unwrap())
}

fn img_re() -> &'static Regex {
    IMG_RE.get_or_init(|| Regex::new(r"(?is)<img\b([^>]*?)/?>").unwrap())
}

/// 取属性值（双引号 / 单引号均可），属性名不区分大小写
fn attr_value(attrs: &str, name: &str) -> Option<String> {
    let re = ATTR_RE.get_or_init(|| {
        Regex::new(r#"(?is)([a-zA-Z_:][-a-zA-Z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
    });
    re.captures_iter(attrs).find_map(|c| {
        if !c[1].eq_ignore_ascii_case(name) {
            return None;
        }
        c.get(2).or_else(|| c.get(3)).map(|m| decode_entities(m.as_str()))
    })
}

/// 属性串的 class 是否包含 wanted 中的全部 class（wanted 以空白分隔）
fn has_classes(attrs: &str, wanted: &str) -> bool {
    let Some(class) = attr_value(attrs, "class") else {
        return false;
    };
    let tokens: Vec<&str> = class.split_whitespace().collect();
    wanted.split_whitespace().all(|w| tokens.contains(&w))
}

/// 第一个带指定 class 的元素，返回 (属性串, 内部 HTML)
fn find_by_class<'h>(re: &Regex, html: &'h str, class: &str) -> Option<(&'h str, &'h str)> {
    re.captures_iter(html).find_map(|c: Captures<'h>| {
        let attrs = c.get(1)?.as_str();
        if has_classes(attrs, class) {
            Some((attrs, c.get(2)?.as_str()))
        } else {
            None
        }
    })
}

/// 按开始标签切片：每段从带指定 class 的开始标签起，到下一段开始为止（最后一段到末尾）。
/// 返回 (开始标签属性串, 切片)；嵌套的同名子元素不会截断切片。
fn slices_by_open_tag<'h>(open_re: &Regex, html: &'h str, class: &str) -> Vec<(&'h str, &'h str)> {
    let starts: Vec<(usize, &'h str)> = open_re
        .captures_iter(html)
        .filter(|c| has_classes(&c[1], class))
        .filter_map(|c| Some((c.get(0)?.start(), c.get(1)?.as_str())))
        .collect();

    starts
        .iter()
        .enumerate()
        .map(|(i, &(start, attrs))| {
            let end = starts.get(i + 1).map(|&(next, _)| next).unwrap_or(html.len());
            (attrs, &html[start..end])
        })
        .collect()
}

fn class_text(re: &Regex, html: &str, class: &str) -> String {
    find_by_class(re, html, class)
        .map(|(_, inner)| text_of(inner))
        .unwrap_or_default()
}

/// 解码常见 HTML 实体（命名实体只处理常用几种，数字实体全部处理）
pub fn decode_entities(s: &str) -> String {
    let re = ENTITY_RE.get_or_init(|| Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").unwrap());
    re.replace_all(s, |c: &Captures| {
        let entity = &c[1];
        let decoded = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
            u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
        } else if let Some(dec) = entity.strip_prefix('#') {
            dec.parse::<u32>().ok().and_then(char::from_u32)
        } else {
            match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                _ => None,
            }
        };
        decoded.map(String::from).unwrap_or_else(|| c[0].to_string())
    })
    .into_owned()
}

/// 去标签、解码实体、折叠空白
pub fn text_of(html: &str) -> String {
    let re = TAG_RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").unwrap());
    let stripped = re.replace_all(html, " ");
    decode_entities(&stripped)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// 判断内容是否像 HTML（需提取可读文本）
pub fn looks_like_html(s: &str) -> bool {
    let s = s.trim_start();
    s.starts_with("<!")
        || s.starts_with("<html")
        || s.starts_with("<HTML")
        || (s.len() > 20
            && s.contains('<')
            && (s.contains("</") || s.contains("<meta") || s.contains("<head") || s.contains("<title")))
}

/// 将 HTML 转为可读文本（去除 script/style 等）
pub fn html_to_text(html: &str, width: usize) -> String {
    match from_read(html.as_bytes(), width) {
        Ok(text) if !text.trim().is_empty() => text,
        _ => text_of(html),
    }
}

/// 按字符数截断，超出时追加 ...[truncated]
pub fn truncate_chars(body: String, max_chars: usize) -> String {
    if body.chars().count() > max_chars {
        body.chars().take(max_chars).collect::<String>() + "\n...[truncated]"
    } else {
        body
    }
}

/// 解析站内搜索结果页；id 为结果在页面中的序号
pub fn extract_search_results(html: &str) -> Vec<SearchResult> {
    slices_by_open_tag(li_open_re(), html, "c-search-result-item")
        .into_iter()
        .enumerate()
        .map(|(id, (attrs, body))| {
            let recommended = has_classes(attrs, "recommendedItem");

            let (url, title) = match a_re().captures(body) {
                Some(a) => {
                    let url = attr_value(&a[1], "href").unwrap_or_default().trim().to_string();
                    let title = find_by_class(h3_re(), &a[2], "c-search-result-item__title")
                        .map(|(_, inner)| text_of(inner))
                        .unwrap_or_else(|| {
                            attr_value(&a[1], "title").unwrap_or_default().trim().to_string()
                        });
                    (url, title)
                }
                None => (String::new(), String::new()),
            };

            SearchResult {
                id,
                url,
                title,
                date: class_text(span_re(), body, "c-search-result-item__date"),
                content: class_text(p_re(), body, "c-search-result-item__content"),
                recommended,
            }
        })
        .collect()
}

/// 解析新闻页卡片；找不到卡片容器时返回空列表
pub fn extract_news_cards(html: &str) -> Vec<NewsCard> {
    let Some(container) = div_open_re()
        .captures_iter(html)
        .find(|c| has_classes(&c[1], "cards-container bs_row"))
        .and_then(|c| c.get(0))
    else {
        return Vec::new();
    };
    let section = &html[container.start()..];

    slices_by_open_tag(
        div_open_re(),
        section,
        "c-cards-press-release__card-container border-primary",
    )
    .into_iter()
    .map(|(_, card)| {
        let image_url = img_re()
            .captures_iter(card)
            .find(|c| has_classes(&c[1], "c-cards-press-release__image"))
            .and_then(|c| attr_value(&c[1], "src"))
            .unwrap_or_default()
            .trim()
            .to_string();

        NewsCard {
            image_url,
            title: class_text(h4_re(), card, "c-cards-press-release__title"),
            excerpt: class_text(p_re(), card, "c-cards-press-release__excerpt"),
            byline: class_text(p_re(), card, "c-cards-press-release__byline"),
        }
    })
    .collect()
}
