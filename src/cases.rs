use crate::error::HarnessError;
use crate::payload::builder::{
    add_context_file, add_message, add_tool_call, build_base, build_webhook, make_code_change,
    CodeChangeSpec,
};
use crate::payload::model::Chunk;
use crate::suite::runner::{CaseKind, CaseSpec, SearchProbe};
use crate::verify::model::{Expectation, NumericPredicate};

fn webhook_case(
    name: &str,
    category: &str,
    project_id: &str,
    file_before: &str,
    file_after: &str,
    chunk: Chunk,
) -> CaseSpec {
    CaseSpec {
        name: name.to_string(),
        category: category.to_string(),
        kind: CaseKind::Webhook {
            payload: build_webhook(file_before, file_after, chunk, project_id),
            expect: Expectation::ingest_success(1),
        },
    }
}

fn chunk(
    file_name: &str,
    file_action: &str,
    line1: u64,
    line2: u64,
    lines_remove: &str,
    lines_add: &str,
) -> Chunk {
    Chunk {
        file_name: file_name.to_string(),
        file_action: file_action.to_string(),
        line1,
        line2,
        lines_remove: lines_remove.to_string(),
        lines_add: lines_add.to_string(),
    }
}

/// The built-in suite: code-change webhooks across languages, severities and
/// edge cases, plus conversation ingests verified through search read-back.
pub fn builtin_cases(project_id: &str) -> Result<Vec<CaseSpec>, HarnessError> {
    let mut cases = Vec::new();

    let python_project = format!("{}_python", project_id);
    let js_project = format!("{}_js", project_id);
    let severity_project = format!("{}_severity", project_id);
    let edge_project = format!("{}_edge", project_id);
    let multilang_project = format!("{}_multilang", project_id);

    cases.push(webhook_case(
        "Python auth service - critical change",
        "Python Tests",
        &python_project,
        "\ndef login(user):\n    return user.token\n",
        "\ndef login(user):\n    if not user:\n        raise ValueError('User is None')\n    if not user.is_active:\n        raise ValueError('User is inactive')\n    return user.token\n",
        chunk(
            "src/auth/auth_service.py",
            "edit",
            2,
            6,
            "    return user.token",
            "    if not user:\n        raise ValueError('User is None')\n    if not user.is_active:\n        raise ValueError('User is inactive')\n    return user.token",
        ),
    ));

    cases.push(webhook_case(
        "Python utility - low severity",
        "Python Tests",
        &python_project,
        "def format_date(d):\n    return str(d)",
        "def format_date(d):\n    return d.strftime('%Y-%m-%d')",
        chunk(
            "src/utils/helpers.py",
            "edit",
            2,
            2,
            "    return str(d)",
            "    return d.strftime('%Y-%m-%d')",
        ),
    ));

    cases.push(webhook_case(
        "Python class - method addition",
        "Python Tests",
        &python_project,
        "\nclass User:\n    def __init__(self, name):\n        self.name = name\n",
        "\nclass User:\n    def __init__(self, name):\n        self.name = name\n    \n    def validate_email(self):\n        return '@' in self.name\n",
        chunk(
            "src/models/user.py",
            "edit",
            4,
            6,
            "",
            "    \n    def validate_email(self):\n        return '@' in self.name",
        ),
    ));

    cases.push(webhook_case(
        "JavaScript API - new endpoint",
        "JavaScript Tests",
        &js_project,
        "\napp.get('/users', (req, res) => {\n  res.json(users);\n});\n",
        "\napp.get('/users', async (req, res) => {\n  const users = await db.getUsers();\n  res.json(users);\n});\n\napp.post('/users', async (req, res) => {\n  const user = await db.createUser(req.body);\n  res.json(user);\n});\n",
        chunk(
            "src/api/users.js",
            "edit",
            1,
            9,
            "app.get('/users', (req, res) => {\n  res.json(users);\n});",
            "app.get('/users', async (req, res) => {\n  const users = await db.getUsers();\n  res.json(users);\n});\n\napp.post('/users', async (req, res) => {\n  const user = await db.createUser(req.body);\n  res.json(user);\n});",
        ),
    ));

    cases.push(webhook_case(
        "TypeScript React - component update",
        "JavaScript Tests",
        &js_project,
        "\nexport const Header = () => {\n  return <div>Hello</div>;\n};\n",
        "\nexport const Header: React.FC = () => {\n  const [user, setUser] = useState(null);\n  \n  return (\n    <div>\n      <h1>Hello {user?.name}</h1>\n    </div>\n  );\n};\n",
        chunk(
            "src/components/Header.tsx",
            "edit",
            1,
            9,
            "export const Header = () => {\n  return <div>Hello</div>;\n};",
            "export const Header: React.FC = () => {\n  const [user, setUser] = useState(null);\n  \n  return (\n    <div>\n      <h1>Hello {user?.name}</h1>\n    </div>\n  );\n};",
        ),
    ));

    cases.push(webhook_case(
        "Critical - Database schema change",
        "Severity Tests",
        &severity_project,
        "CREATE TABLE users (id INT, name VARCHAR(100));",
        "CREATE TABLE users (\n  id INT PRIMARY KEY,\n  name VARCHAR(100) NOT NULL,\n  email VARCHAR(255) UNIQUE,\n  password_hash VARCHAR(255) NOT NULL,\n  created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP\n);",
        chunk(
            "migrations/001_create_users.sql",
            "edit",
            1,
            6,
            "CREATE TABLE users (id INT, name VARCHAR(100));",
            "CREATE TABLE users (\n  id INT PRIMARY KEY,\n  name VARCHAR(100) NOT NULL,\n  email VARCHAR(255) UNIQUE,\n  password_hash VARCHAR(255) NOT NULL,\n  created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP\n);",
        ),
    ));

    cases.push(webhook_case(
        "High - Security vulnerability fix",
        "Severity Tests",
        &severity_project,
        "const token = req.headers.token;",
        "const token = req.headers.authorization?.replace('Bearer ', '');\nif (!token || !validateToken(token)) {\n  return res.status(401).json({ error: 'Unauthorized' });\n}",
        chunk(
            "src/middleware/security.js",
            "edit",
            1,
            4,
            "const token = req.headers.token;",
            "const token = req.headers.authorization?.replace('Bearer ', '');\nif (!token || !validateToken(token)) {\n  return res.status(401).json({ error: 'Unauthorized' });\n}",
        ),
    ));

    cases.push(webhook_case(
        "Low - README update",
        "Severity Tests",
        &severity_project,
        "# My Project\n\nA simple app",
        "# My Project\n\nA simple app for managing users.\n\n## Installation\n\n```bash\nnpm install\n```",
        chunk(
            "README.md",
            "edit",
            3,
            8,
            "A simple app",
            "A simple app for managing users.\n\n## Installation\n\n```bash\nnpm install\n```",
        ),
    ));

    cases.push(webhook_case(
        "Low - Test file update",
        "Severity Tests",
        &severity_project,
        "def test_login():\n    pass",
        "def test_login():\n    user = create_user('test@example.com')\n    result = login(user)\n    assert result.token is not None",
        chunk(
            "tests/test_auth.py",
            "edit",
            2,
            4,
            "    pass",
            "    user = create_user('test@example.com')\n    result = login(user)\n    assert result.token is not None",
        ),
    ));

    let old_impl = format!("# Old implementation\n{}", "def process():\n    pass\n".repeat(50));
    let new_impl = format!(
        "# New implementation\n{}",
        "async def process():\n    await task()\n".repeat(50)
    );
    cases.push(webhook_case(
        "Edge - Large refactoring (100+ lines)",
        "Edge Cases",
        &edge_project,
        &old_impl,
        &new_impl,
        chunk("src/core/processor.py", "edit", 1, 150, &old_impl, &new_impl),
    ));

    cases.push(webhook_case(
        "Edge - Only whitespace changes",
        "Edge Cases",
        &edge_project,
        "def hello():\n    print('hi')",
        "def hello():\n    \n    print('hi')\n    ",
        chunk(
            "src/hello.py",
            "edit",
            2,
            3,
            "    print('hi')",
            "    \n    print('hi')\n    ",
        ),
    ));

    cases.push(webhook_case(
        "Edge - New file creation",
        "Edge Cases",
        &edge_project,
        "",
        "export const config = {\n  apiUrl: 'http://localhost:3000'\n};",
        chunk(
            "src/config.js",
            "add",
            1,
            3,
            "",
            "export const config = {\n  apiUrl: 'http://localhost:3000'\n};",
        ),
    ));

    cases.push(webhook_case(
        "Edge - File deletion",
        "Edge Cases",
        &edge_project,
        "const OLD_CODE = 'deprecated';",
        "",
        chunk(
            "src/deprecated.js",
            "remove",
            1,
            1,
            "const OLD_CODE = 'deprecated';",
            "",
        ),
    ));

    cases.push(webhook_case(
        "Go - HTTP handler",
        "Multi-Language",
        &multilang_project,
        "func handler(w http.ResponseWriter, r *http.Request) {\n\tfmt.Fprintf(w, \"Hello\")\n}",
        "func handler(w http.ResponseWriter, r *http.Request) {\n\tif r.Method != \"GET\" {\n\t\thttp.Error(w, \"Method not allowed\", 405)\n\t\treturn\n\t}\n\tfmt.Fprintf(w, \"Hello\")\n}",
        chunk(
            "main.go",
            "edit",
            2,
            6,
            "\tfmt.Fprintf(w, \"Hello\")",
            "\tif r.Method != \"GET\" {\n\t\thttp.Error(w, \"Method not allowed\", 405)\n\t\treturn\n\t}\n\tfmt.Fprintf(w, \"Hello\")",
        ),
    ));

    cases.push(webhook_case(
        "Rust - Error handling",
        "Multi-Language",
        &multilang_project,
        "fn divide(a: i32, b: i32) -> i32 {\n    a / b\n}",
        "fn divide(a: i32, b: i32) -> Result<i32, String> {\n    if b == 0 {\n        return Err(\"Division by zero\".to_string());\n    }\n    Ok(a / b)\n}",
        chunk(
            "src/math.rs",
            "edit",
            1,
            5,
            "fn divide(a: i32, b: i32) -> i32 {\n    a / b\n}",
            "fn divide(a: i32, b: i32) -> Result<i32, String> {\n    if b == 0 {\n        return Err(\"Division by zero\".to_string());\n    }\n    Ok(a / b)\n}",
        ),
    ));

    cases.push(webhook_case(
        "Java - Exception handling",
        "Multi-Language",
        &multilang_project,
        "public void process(String data) {\n    System.out.println(data);\n}",
        "public void process(String data) throws IllegalArgumentException {\n    if (data == null || data.isEmpty()) {\n        throw new IllegalArgumentException(\"Data cannot be null or empty\");\n    }\n    System.out.println(data);\n}",
        chunk(
            "src/main/java/Processor.java",
            "edit",
            1,
            5,
            "public void process(String data) {\n    System.out.println(data);\n}",
            "public void process(String data) throws IllegalArgumentException {\n    if (data == null || data.isEmpty()) {\n        throw new IllegalArgumentException(\"Data cannot be null or empty\");\n    }\n    System.out.println(data);\n}",
        ),
    ));

    cases.push(batch_sweep(project_id));
    cases.push(refactoring_conversation(project_id)?);
    cases.push(bugfix_conversation(project_id)?);

    Ok(cases)
}

/// Two small changes through the batch endpoint, convergence observed via
/// the project stats counters instead of a search.
fn batch_sweep(project_id: &str) -> CaseSpec {
    let batch_project = format!("{}_batch", project_id);
    let first = build_webhook(
        "MAX_CONNECTIONS = 10",
        "MAX_CONNECTIONS = 50",
        chunk(
            "src/settings.py",
            "edit",
            1,
            1,
            "MAX_CONNECTIONS = 10",
            "MAX_CONNECTIONS = 50",
        ),
        &batch_project,
    );
    let second = build_webhook(
        "export const retries = 1;",
        "export const retries = 3;",
        chunk(
            "src/client.ts",
            "edit",
            1,
            1,
            "export const retries = 1;",
            "export const retries = 3;",
        ),
        &batch_project,
    );
    CaseSpec {
        name: "Batch - settings sweep across two files".to_string(),
        category: "Batch Ingest".to_string(),
        kind: CaseKind::Batch {
            payloads: vec![first, second],
            expect: Expectation::new()
                .equals("$.status", serde_json::Value::String("success".to_string()))
                .count("$.total_chunks", NumericPredicate::EqualTo(2.0)),
            stats_project: batch_project,
            stats_expect: Expectation::new()
                .count("$.entity_count", NumericPredicate::AtLeast(1.0)),
        },
    }
}

fn refactoring_conversation(project_id: &str) -> Result<CaseSpec, HarnessError> {
    let mut payload = build_base(
        "req_refactor_async_001",
        project_id,
        "chat_refactor",
        "AGENT",
    )?;
    add_message(
        &mut payload,
        "user",
        "Convert get_user_data() to async/await - it's blocking and causing performance issues",
        42,
    );
    add_message(
        &mut payload,
        "assistant",
        "Refactored get_user_data() to async/await pattern using asyncpg. Updated 3 callers. \
         Performance improved: 450ms to 85ms (81% faster). All tests passing.",
        640,
    );
    add_context_file(&mut payload, "database/users.py", 0.98);
    add_context_file(&mut payload, "api/users.py", 0.85);
    add_tool_call(&mut payload, "read_file", "success", 200);
    add_tool_call(&mut payload, "edit_file", "success", 520);
    add_tool_call(&mut payload, "run_tests", "success", 3450);
    payload.code_changes.push(make_code_change(
        CodeChangeSpec::builder()
            .file_path("database/users.py".to_string())
            .change_summary(
                "Converted get_user_data() from synchronous to async/await pattern".to_string(),
            )
            .change_type("refactored".to_string())
            .severity("medium".to_string())
            .lines_added(8)
            .lines_removed(6)
            .imports(vec!["asyncpg".to_string()])
            .build(),
    ));

    Ok(CaseSpec {
        name: "Async refactoring conversation".to_string(),
        category: "Conversation Flows".to_string(),
        kind: CaseKind::Conversation {
            payload,
            probe: SearchProbe {
                query: "async await performance refactoring database".to_string(),
                expect: Expectation::new()
                    .count("$.results", NumericPredicate::GreaterThan(0.0)),
            },
        },
    })
}

fn bugfix_conversation(project_id: &str) -> Result<CaseSpec, HarnessError> {
    let mut payload = build_base("req_bug_keyerror_001", project_id, "chat_debug", "AGENT")?;
    add_message(
        &mut payload,
        "user",
        "Getting KeyError: 'user_preferences' in production at api/profile.py line 67. \
         Happening randomly for some users.",
        55,
    );
    add_message(
        &mut payload,
        "assistant",
        "Found the issue! New users don't have the user_preferences key. Added defensive \
         programming with .get() and a default fallback, plus a migration script and a \
         regression test.",
        480,
    );
    add_context_file(&mut payload, "api/profile.py", 0.96);
    add_context_file(&mut payload, "models/user.py", 0.91);
    add_tool_call(&mut payload, "read_file", "success", 200);
    add_tool_call(&mut payload, "run_query", "success", 1250);
    add_tool_call(&mut payload, "edit_file", "success", 412);
    payload.code_changes.push(make_code_change(
        CodeChangeSpec::builder()
            .file_path("api/profile.py".to_string())
            .change_summary(
                "Added defensive programming for missing user_preferences with default fallback"
                    .to_string(),
            )
            .change_type("fixed".to_string())
            .severity("high".to_string())
            .lines_added(5)
            .lines_removed(2)
            .build(),
    ));

    Ok(CaseSpec {
        name: "KeyError bugfix conversation".to_string(),
        category: "Conversation Flows".to_string(),
        kind: CaseKind::Conversation {
            payload,
            probe: SearchProbe {
                query: "keyerror bug user preferences profile error".to_string(),
                expect: Expectation::new()
                    .count("$.results", NumericPredicate::GreaterThan(0.0)),
            },
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_names_are_unique() {
        let cases = builtin_cases("memprobe_suite").unwrap();
        let mut names: Vec<&str> = cases.iter().map(|c| c.name.as_str()).collect();
        let before = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), before);
    }

    #[test]
    fn catalog_covers_every_category() {
        let cases = builtin_cases("memprobe_suite").unwrap();
        for category in [
            "Python Tests",
            "JavaScript Tests",
            "Severity Tests",
            "Edge Cases",
            "Multi-Language",
            "Batch Ingest",
            "Conversation Flows",
        ] {
            assert!(
                cases.iter().any(|c| c.category == category),
                "missing category {}",
                category
            );
        }
    }

    #[test]
    fn conversation_cases_target_the_suite_project() {
        let cases = builtin_cases("memprobe_suite").unwrap();
        for case in cases {
            if let CaseKind::Conversation { payload, .. } = case.kind {
                assert_eq!(payload.project_id, "memprobe_suite");
                assert!(!payload.messages.is_empty());
                assert!(!payload.tool_calls.is_empty());
            }
        }
    }

    #[test]
    fn large_refactor_case_exceeds_large_bucket_threshold() {
        let cases = builtin_cases("memprobe_suite").unwrap();
        let case = cases
            .iter()
            .find(|c| c.name.starts_with("Edge - Large"))
            .unwrap();
        if let CaseKind::Webhook { payload, .. } = &case.kind {
            let total = payload.chunks[0].lines_add.lines().count()
                + payload.chunks[0].lines_remove.lines().count();
            assert!(total >= 50);
        } else {
            panic!("large refactor should be a webhook case");
        }
    }
}
