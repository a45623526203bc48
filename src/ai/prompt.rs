//! Prompt templates for the two completion paths.
//!
//! Both inputs are embedded verbatim. They are display text for the model,
//! never interpreted locally.

/// System role for clinical summary generation.
pub const SUMMARY_SYSTEM_PROMPT: &str =
    "Sen deneyimli bir akupunktur uzmanı yardımcı AI sistemisin.";

/// System role for the question-answering panel.
pub const QUESTION_SYSTEM_PROMPT: &str =
    "Sen geleneksel Çin Tıbbı konusunda bilgi veren bir öğretici AI asistansın.";

/// Build the user prompt for a clinical summary.
pub fn build_summary_prompt(symptoms: &str, physical_findings: &str) -> String {
    format!(
        "Aşağıdaki hasta bilgilerine dayanarak Çin Tıbbı prensiplerine göre bir değerlendirme yap:\n\
         - Semptomları Çin Tıbbı'na göre tanımla\n\
         - \"Akupunktur Noktaları\" başlığı altında her bir semptom için özgül noktaları öner\n\
         - Gerekirse tamamlayıcı yöntemler öner\n\
         - ICD-10 tanı kodlarını ve \"Takip Planı\"nı ver\n\
         Kullanıcıdan gelen bilgiler:\n\
         Semptomlar: {symptoms}\n\
         Muayene Bulguları: {physical_findings}\n"
    )
}

/// Build the user prompt for a free-text question.
pub fn build_question_prompt(question: &str) -> String {
    format!("Soru: {question}\nCevap:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_prompt_embeds_inputs_verbatim() {
        let prompt = build_summary_prompt("bel ağrısı <b>", "hareket kısıtlılığı");
        assert!(prompt.contains("Semptomlar: bel ağrısı <b>\n"));
        assert!(prompt.contains("Muayene Bulguları: hareket kısıtlılığı\n"));
    }

    #[test]
    fn summary_prompt_requests_points_and_follow_up() {
        let prompt = build_summary_prompt("a", "b");
        assert!(prompt.contains("\"Akupunktur Noktaları\""));
        assert!(prompt.contains("ICD-10"));
        assert!(prompt.contains("Takip Planı"));
    }

    #[test]
    fn question_prompt_shape() {
        assert_eq!(build_question_prompt("GB20 nedir?"), "Soru: GB20 nedir?\nCevap:");
    }
}
