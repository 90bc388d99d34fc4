pub fn is_env_enable(env_name: &str) -> bool {
	match std::env::var(env_name) {
		Ok(s) => {
			vec!["1", "true", "yes", "ya"].contains(&s.to_lowercase().as_str())
		},
		Err(_) => false
	}
}

// Same rules as Python's str.title(): a letter following another letter is lowered,
// any other letter is raised
pub fn title_case(s: &str) -> String {
	let mut result = String::with_capacity(s.len());
	let mut previous_is_letter = false;

	for c in s.chars() {
		if previous_is_letter {
			result.extend(c.to_lowercase());
		} else {
			result.extend(c.to_uppercase());
		}

		previous_is_letter = c.is_alphabetic();
	}

	result
}

pub fn initials(s: &str) -> String {
	s.split_whitespace()
		.filter_map(|word| word.chars().next())
		.flat_map(|c| c.to_uppercase())
		.collect()
}
