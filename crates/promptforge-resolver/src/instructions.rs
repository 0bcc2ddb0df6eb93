use promptforge_types::{Instruction, InstructionCategory};
use std::cmp::Ordering;

/// Enabled instructions, optionally of one category, highest priority first
///
/// Equal priorities fall back to byte-wise name order, so the result does
/// not depend on the input order.
pub fn resolve_instructions(
    all_instructions: &[Instruction],
    category_filter: Option<InstructionCategory>,
) -> Vec<Instruction> {
    let mut resolved: Vec<Instruction> = all_instructions
        .iter()
        .filter(|i| i.enabled)
        .filter(|i| category_filter.map_or(true, |category| i.category == category))
        .cloned()
        .collect();

    resolved.sort_by(by_priority_then_name);
    resolved
}

fn by_priority_then_name(a: &Instruction, b: &Instruction) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| a.name.cmp(&b.name))
}
