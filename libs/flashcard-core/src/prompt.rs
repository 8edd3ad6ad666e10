//! Prompt construction for flashcard generation.

const RESPONSE_FORMAT: &str = r#"Respond with a JSON object in exactly this shape:
{
  "title": "Short title for this flashcard set",
  "description": "Optional one-line summary of what the set covers",
  "flashcards": [
    {
      "question": "Clear, specific question",
      "answer": "Complete, helpful answer"
    }
  ]
}"#;

const GUIDELINES: &[&str] = &[
    "Create as many flashcards as the material needs",
    "Questions should be clear and test understanding",
    "Answers should be complete but concise",
    "Cover key concepts, definitions, formulas and important facts",
    "For math problems, give step-by-step solutions in the answer",
    "Increase difficulty gradually where it makes sense",
    "Focus on what a student needs for homework and tests",
];

/// Build the instruction text sent alongside the images.
///
/// Multi-image requests tell the model to read every page. Non-blank custom
/// instructions are appended verbatim.
pub fn build_prompt(image_count: usize, custom_instructions: Option<&str>) -> String {
    let custom = custom_instructions.filter(|c| !c.trim().is_empty());
    let mut prompt = String::new();

    if image_count > 1 {
        prompt.push_str(&format!(
            "You will see {n} images below. They are all pages of the same homework or study \
             material. Look at ALL {n} images carefully before writing flashcards.\n\n\
             Create flashcards that help a student learn the content of ALL the images.",
            n = image_count
        ));
    } else {
        prompt.push_str(
            "Analyze this homework or study material image and create flashcards that help a \
             student learn its content.",
        );
    }

    if let Some(instructions) = custom {
        prompt.push_str("\n\nSpecial Instructions: ");
        prompt.push_str(instructions);
    }

    prompt.push_str("\n\n");
    prompt.push_str(RESPONSE_FORMAT);
    prompt.push_str("\n\nGuidelines:\n");
    for line in GUIDELINES {
        prompt.push_str("- ");
        prompt.push_str(line);
        prompt.push('\n');
    }
    if image_count > 1 {
        prompt.push_str("- Use content from ALL images, not just the first one\n");
    }
    if custom.is_some() {
        prompt.push_str("- Follow the special instructions above\n");
    }

    prompt.push_str("\nReturn ONLY the JSON object, with no other text.");
    prompt
}
