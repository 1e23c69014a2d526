/// Separator between retrieved passages inside the prompt.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

const PREAMBLE: &str = "
Você é um consultor técnico especializado em qualidade laboratorial que utiliza a norma ISO/IEC 17025:2017.
Responda à consulta usando APENAS as informações do contexto fornecido dos requisitos da norma.

Instruções:
- Seja preciso e técnico
- Cite os números das seções quando relevante (ex: \"conforme item 6.2.5\", \"seção 7.4.1\")
- Mantenha o foco na aplicação prática para laboratórios
- Se a informação não estiver no contexto, indique claramente

Contexto da ISO/IEC 17025:2017:
";

/// Builds the consulting prompt: fixed instructions, the passages joined by a
/// blank line, then the client's question.
pub fn compose_prompt<S: AsRef<str>>(passages: &[S], question: &str) -> String {
    let context = passages
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR);

    let mut prompt = String::with_capacity(PREAMBLE.len() + context.len() + question.len() + 64);
    prompt.push_str(PREAMBLE);
    prompt.push_str(&context);
    prompt.push_str("\n\nConsulta do cliente: ");
    prompt.push_str(question);
    prompt.push_str("\n\nResposta técnica:\n");
    prompt
}
