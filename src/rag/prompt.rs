use super::store::Passage;

const PROMPT_TEMPLATE: &str = "Answer the following question based only on the provided context:

<context>
{context}
</context>

Question: {input}";

const PASSAGE_SEPARATOR: &str = "\n\n";

/// Fills the fixed answer-from-context template.
///
/// Passage and question text are inserted verbatim, with no escaping.
pub fn assemble(passages: &[Passage], question: &str) -> String {
    let context = passages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join(PASSAGE_SEPARATOR);

    // Single pass so that placeholder-looking text inside a passage is left alone.
    let (head, rest) = PROMPT_TEMPLATE
        .split_once("{context}")
        .unwrap_or((PROMPT_TEMPLATE, ""));
    let (middle, tail) = rest.split_once("{input}").unwrap_or((rest, ""));

    let mut prompt =
        String::with_capacity(PROMPT_TEMPLATE.len() + context.len() + question.len());
    prompt.push_str(head);
    prompt.push_str(&context);
    prompt.push_str(middle);
    prompt.push_str(question);
    prompt.push_str(tail);
    prompt
}
