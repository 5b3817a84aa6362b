pub fn render_schema() -> String {
	let init = include_str!("../../../sql/init.sql");

	expand_includes(init)
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"tables/001_creators.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_creators.sql")),
				"tables/002_search_sessions.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_search_sessions.sql")),
				"tables/003_search_session_results.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_search_session_results.sql")),
				"tables/004_query_cache.sql" =>
					out.push_str(include_str!("../../../sql/tables/004_query_cache.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn renders_all_tables() {
		let sql = render_schema();

		for table in ["creators", "search_sessions", "search_session_results", "query_cache"] {
			assert!(
				sql.contains(&format!("CREATE TABLE IF NOT EXISTS {table}")),
				"schema must create {table}"
			);
		}

		assert!(!sql.contains("\\ir "), "every include must be expanded");
	}
}
