use promptforge_types::{ForgeError, ForgeResult, RecordKind, Skill};

/// Exact id match first, then the first case-insensitive name match
pub fn find_skill<'a>(id_or_name: &str, all_skills: &'a [Skill]) -> ForgeResult<&'a Skill> {
    if let Some(skill) = all_skills.iter().find(|s| s.id == id_or_name) {
        return Ok(skill);
    }

    let wanted = id_or_name.to_lowercase();
    all_skills
        .iter()
        .find(|s| s.name.to_lowercase() == wanted)
        .ok_or_else(|| ForgeError::not_found(RecordKind::Skill, id_or_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use promptforge_types::NewSkill;

    fn skill(id: &str, name: &str) -> Skill {
        Skill::new(id.to_string(), NewSkill::prompt(name, "t"), Utc::now())
    }

    #[test]
    fn test_name_match_is_case_insensitive() {
        let skills = vec![skill("s1", "Other"), skill("s2", "my skill")];
        assert_eq!(find_skill("My Skill", &skills).unwrap().id, "s2");
    }

    #[test]
    fn test_id_wins_over_name() {
        let skills = vec![skill("s1", "review"), skill("review", "Something Else")];
        assert_eq!(find_skill("review", &skills).unwrap().id, "review");
    }

    #[test]
    fn test_first_name_match_in_collection_order() {
        let skills = vec![skill("s1", "Dup"), skill("s2", "dup")];
        assert_eq!(find_skill("DUP", &skills).unwrap().id, "s1");
    }

    #[test]
    fn test_missing_carries_key() {
        let err = find_skill("ghost", &[]).unwrap_err();
        assert_eq!(err, ForgeError::not_found(RecordKind::Skill, "ghost"));
    }
}
