use tracing::{debug, warn};

use super::{LlmClient, Message};

const MAX_TRANSCRIPT_CHARS: usize = 80_000;
const MAX_DESCRIPTION_CHARS: usize = 500;
const MAX_CONTEXT_TAGS: usize = 5;

/// Video metadata passed to the article prompt.
#[derive(Debug, Clone, Default)]
pub struct ArticleContext {
    pub title: String,
    pub description: Option<String>,
    pub channel: Option<String>,
    pub tags: Vec<String>,
    pub duration_secs: Option<u64>,
}

impl ArticleContext {
    fn render(&self) -> String {
        let mut parts = vec![format!("動画タイトル: {}", self.title)];

        if let Some(description) = &self.description {
            if !description.is_empty() {
                let head: String = description.chars().take(MAX_DESCRIPTION_CHARS).collect();
                parts.push(format!("動画説明文: {head}"));
            }
        }

        if let Some(channel) = &self.channel {
            if !channel.is_empty() {
                parts.push(format!("チャンネル: {channel}"));
            }
        }

        if !self.tags.is_empty() {
            let tags = self
                .tags
                .iter()
                .take(MAX_CONTEXT_TAGS)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            parts.push(format!("タグ: {tags}"));
        }

        if let Some(secs) = self.duration_secs {
            let hours = secs / 3600;
            let minutes = (secs % 3600) / 60;
            if hours > 0 {
                parts.push(format!("動画の長さ: {hours}時間{minutes}分"));
            } else {
                parts.push(format!("動画の長さ: {minutes}分"));
            }
        }

        parts.join("\n")
    }
}

/// Generate a structured Japanese article from a video transcript.
///
/// Returns `None` when the transcript is empty or the request fails; the
/// caller simply clips the raw sections without an article.
pub async fn generate_article(
    llm: &LlmClient,
    transcript: &str,
    context: &ArticleContext,
) -> Option<String> {
    if transcript.is_empty() {
        return None;
    }

    let mut transcript_text: String = transcript.chars().take(MAX_TRANSCRIPT_CHARS).collect();
    if transcript.chars().count() > MAX_TRANSCRIPT_CHARS {
        transcript_text.push_str("...[以下省略]");
    }

    let context_text = context.render();
    let prompt = format!(
        r#"以下のYouTube動画の字幕から、読みやすく構造化された記事を作成してください。
この記事はゲーム開発者やマーケターが読むことを想定しています。

【要件】
1. 動画の核心となるメッセージを明確に抽出
2. 論理的な構造で情報を整理（導入→本論→結論）
3. 重要な洞察やアクションアイテムを強調
4. ゲーム開発・マーケティングの観点から実践的な価値を提供
5. 専門用語は適切に説明し、初心者にも理解しやすく
6. 具体例や数値データがあれば積極的に活用
7. 記事は日本語で、プロフェッショナルなトーンで作成

【動画情報】
{context_text}

【字幕テキスト】
{transcript_text}

【出力形式】
以下の構造でMarkdown形式の記事を作成してください：

# [魅力的で内容を的確に表すタイトル]

## 📌 エグゼクティブサマリー
[3-5文で動画の要点を簡潔にまとめる]

## 🎯 この記事で学べること
[箇条書きで3-5個の主要な学習ポイント]

## 📊 主要な内容

### [セクション1のタイトル]
[内容を詳しく説明]

### [セクション2のタイトル]
[内容を詳しく説明]

### [セクション3のタイトル]
[内容を詳しく説明]

## 💡 重要な洞察とポイント
[動画から得られる重要な洞察を箇条書きで]

## 🚀 実践への応用
[この内容をどのように実践に活かせるか]

## 📝 まとめ
[全体のまとめと次のアクション]

---
記事を作成してください："#
    );

    match llm.chat(vec![Message::user(prompt)], Some(8000)).await {
        Ok(article) => {
            let article = article.trim().to_string();
            if article.is_empty() {
                None
            } else {
                debug!(chars = article.chars().count(), "Generated article");
                Some(article)
            }
        }
        Err(e) => {
            warn!(error = %e, "Article generation failed");
            None
        }
    }
}
