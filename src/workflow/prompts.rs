//! Role instructions and user-context templates for the text nodes.

pub const TOPIC_GENERATOR_ROLE: &str = "You are a topic generator for professional social media. \
Given a niche, reply with exactly one specific, timely post topic on a single line. \
Do not add quotes, numbering or commentary.";

pub const CONTENT_CREATOR_ROLE: &str = "You are a content creator writing professional posts. \
Write an engaging post of 120 to 220 words with a strong opening line, short paragraphs, \
one concrete takeaway and three relevant hashtags at the end. Reply with the post text only.";

pub const REVIEWER_ROLE: &str = "You are a strict editor reviewing professional posts. \
If the draft is ready to publish, reply with the single word APPROVED. \
Otherwise reply with a concise critique followed by a revised version of the post.";

/// Image prompt wrapper for the image service
pub const IMAGE_PROMPT_TEMPLATE: &str = "Create a clean, professional illustration suitable \
for a business social media post about the following content. No text in the image.\n\n{topic}";

/// Literal approval token; matched case-insensitively
pub const APPROVAL_TOKEN: &str = "APPROVED";

pub fn topic_context(niche: &str) -> String {
    format!("Suggest one post topic for the niche: {niche}")
}

pub fn content_context(topic: &str, feedback: Option<&str>) -> String {
    match feedback {
        Some(feedback) => format!(
            "Write a post about: {topic}\n\nReviewer feedback on the previous draft:\n{feedback}"
        ),
        None => format!("Write a post about: {topic}"),
    }
}

pub fn review_context(draft: &str) -> String {
    format!("Critique this draft:\n\n{draft}")
}

pub fn image_prompt(post: &str) -> String {
    IMAGE_PROMPT_TEMPLATE.replace("{topic}", post)
}

pub fn contains_approval(text: &str) -> bool {
    text.to_uppercase().contains(APPROVAL_TOKEN)
}
