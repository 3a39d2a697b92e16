//! Instruction template for the skill-to-command rewrite.

/// Placeholder replaced by the serialized skill context.
pub const CONTEXT_PLACEHOLDER: &str = "{{context_blob}}";

/// Sentence the model must end every generated prompt with.
pub const ARGUMENT_INVITATION: &str = "Now, carry out the task according to the user's request below:";

pub const COMPILE_TEMPLATE: &str = r#"You are an expert AI software engineer who knows both Claude Skills and Gemini CLI custom commands.
Your job is to compile the complete context of one Claude Skill into a single Gemini CLI custom command file in TOML format.

**Input: Claude Skill structure**
You are given a context blob. Every file of the skill is packed into it between delimiter lines of the form `--- BEGIN FILE: <path> ---` and `--- END FILE: <path> ---`. The text before the first delimiter is SKILL.MD, the main instruction file. The other files are resources it refers to.

**Output: Gemini CLI TOML structure**
Produce the contents of a .toml file with exactly these two fields:

1. `description = "..."`: one short sentence distilled from the intent of SKILL.MD.
2. `prompt = """..."""`: one single, complete prompt.

**Rules**

1. Inline everything. Copy the instructions from SKILL.MD and the FULL content of every resource file (.js, .html, .py and so on) verbatim into the single `prompt` field. Never refer to external files by name alone.
2. Rewrite the instructions. SKILL.MD describes the skill to a human ("This skill helps you..."). Rewrite that into first-person operational instructions for the model that will run the command (for example: "I am an algorithmic artist...").
3. Provide context. Inside `prompt`, state explicitly which material to use, for example: "I will use the following code: ...[full content of code.js]... I will use the following HTML structure: ...[full content of style.html]...".
4. Accept arguments. The last line of `prompt` must be exactly: "Now, carry out the task according to the user's request below:"
5. Format. Output ONLY the raw TOML text, starting with `description =`. No greetings, no explanations, no markdown.

**[Input] Context blob:**

```
{{context_blob}}
```

**[Output] TOML file content:**
"#;

/// Substitute the serialized skill into the template's single placeholder.
pub fn render_compile_prompt(context_blob: &str) -> String {
    // replacen: a placeholder-looking string inside the skill itself stays untouched
    COMPILE_TEMPLATE.replacen(CONTEXT_PLACEHOLDER, context_blob, 1)
}
