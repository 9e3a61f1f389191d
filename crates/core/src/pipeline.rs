use crate::age::extract_age;
use crate::content::ContentProvider;
use crate::intent::classify_intent;
use crate::language::resolve_language;
use crate::models::{MessageRequest, MessageResult};
use crate::reply::compose_reply;

/// Language, intent, age and reply for one inbound message. Delivery is the
/// caller's job.
pub fn process_message(content: &dyn ContentProvider, request: &MessageRequest) -> MessageResult {
    let lang = resolve_language(request.language_hint.as_deref(), &request.text);
    let intent = classify_intent(&request.text, lang);
    let age = extract_age(&request.text);
    let reply = compose_reply(content, lang, intent, age, request.pincode.as_deref());

    MessageResult {
        to: request.phone.clone(),
        lang,
        intent,
        reply,
    }
}
