//! Instruction templates for the four model-backed stages.
//!
//! System prompts are static; user prompts are built from the question and
//! the outputs of earlier stages.

use super::types::{AssessorResult, ClassifierResult};

/// Stage 1 system instruction.
pub const CLASSIFIER_SYSTEM_PROMPT: &str = "\
You are AGENT 1: SUBJECT CLASSIFIER.
Detect the subject, topic and subtopic of the student's question.
Respond with a single JSON object and nothing else (no markdown fences):
{
  \"subject\": \"Math | Science | History | English | CS | Other\",
  \"topic\": \"string\",
  \"subtopic\": \"string\",
  \"confidence\": number between 0 and 100,
  \"keywords\": [\"string\"],
  \"reasoning\": [\"analysis step\"]
}";

/// Stage 2 system instruction.
pub const ASSESSOR_SYSTEM_PROMPT: &str = "\
You are AGENT 2: DIFFICULTY ASSESSOR.
Judge how complex the question is and which grade level it belongs to.
Respond with a single JSON object and nothing else (no markdown fences):
{
  \"intrinsicDifficulty\": \"Easy | Medium | Hard\",
  \"gradeLevel\": \"string, e.g. Grade 9-10\",
  \"adjustedDifficulty\": \"Easy | Medium | Hard\",
  \"complexityFactors\": [\"factor\"],
  \"reasoning\": \"why this difficulty was assigned\",
  \"confidence\": number between 0 and 100
}";

/// Stage 3 system instruction.
pub const SOLVER_SYSTEM_PROMPT: &str = "\
You are AGENT 3: SOLUTION GENERATOR.
Give a complete, step-by-step explanation a student can learn from.

Voice: read the Subject in the context and adapt.
- History / English: academic. Formal, articulate, attentive to context and nuance.
- Math / Science: logical. Clear structure and concrete analogies.
- CS: technical. Precise and algorithmic.
- Anything else: a patient, friendly tutor.

Output markdown with these sections:
1. **Problem Understanding**
2. **Step-by-Step Solution** (each step: Action, Why, Work, Intermediate Result)
3. **Suggested Visual Aid** (required for Math and Science): describe a simple
   picture or diagram, what it shows and why it helps.
4. **Final Answer** (bold)
5. **Verification Step**
6. **Key Concepts**
7. **Common Mistakes**

Be encouraging. Emojis are welcome where they help (💡 📝 ➡ 🎨).
Never output JSON.";

/// Stage 4 system instruction.
pub const PRACTICE_SYSTEM_PROMPT: &str = "\
You are AGENT 4: PRACTICE GENERATOR.
Write 3 practice problems similar to the solved one:
1. Warm-up (easier)
2. Same level
3. Challenge (harder)

For each give the Question, a Hint and the Correct Answer, listed clearly.
Output markdown.";

/// Fixed practice text used when the model returns nothing.
pub const PRACTICE_FALLBACK: &str = "Could not generate practice problems.";

/// Separator between the solution and the practice problems.
pub const PRACTICE_SEPARATOR: &str = "\n\n---\n\n";

/// Solution context passed to the practice stage is capped to keep the
/// request small; the opening of a solution carries the method.
const PRACTICE_CONTEXT_CHARS: usize = 4000;

pub fn build_classifier_prompt(question: &str) -> String {
    format!("Analyze this student question: \"{question}\"")
}

pub fn build_assessor_prompt(question: &str, classification: &ClassifierResult) -> String {
    format!(
        "Context: Subject: {}, Topic: {}. Question: \"{}\"",
        classification.subject, classification.topic, question
    )
}

pub fn build_solver_prompt(
    question: &str,
    classification: &ClassifierResult,
    assessment: &AssessorResult,
) -> String {
    format!(
        "Context:\n\
         Subject: {subject}\n\
         Topic: {topic}\n\
         Difficulty: {difficulty}\n\
         Grade Level: {grade}\n\n\
         Solve this Step-by-Step: \"{question}\"",
        subject = classification.subject,
        topic = classification.topic,
        difficulty = assessment.adjusted_difficulty,
        grade = assessment.grade_level,
    )
}

pub fn build_practice_prompt(question: &str, solution: &str) -> String {
    let context: String = solution.chars().take(PRACTICE_CONTEXT_CHARS).collect();
    format!(
        "Original Question: \"{question}\"\n\n\
         Solution given to the student:\n{context}\n\n\
         Generate 3 practice problems now."
    )
}
