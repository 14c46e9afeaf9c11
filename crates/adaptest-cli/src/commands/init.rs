//! The `adaptest init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("adaptest.toml").exists() {
        println!("adaptest.toml already exists, skipping.");
    } else {
        std::fs::write("adaptest.toml", SAMPLE_CONFIG)?;
        println!("Created adaptest.toml");
    }

    let bank_path = std::path::Path::new("questions.toml");
    if bank_path.exists() {
        println!("questions.toml already exists, skipping.");
    } else {
        std::fs::write(bank_path, SAMPLE_BANK)?;
        println!("Created questions.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit questions.toml with your own questions");
    println!("  2. Run: adaptest validate --bank questions.toml");
    println!("  3. Run: adaptest run --user <your-name> --tree tree.json");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# adaptest configuration

bank = "questions.toml"
results_dir = "./adaptest-results"
provider_timeout_secs = 10

# Alternatives for the diagnostic tree come from the local bank by default.
# To use a remote diagnostic backend instead:
#
# [alternatives]
# type = "http"
# base_url = "${ADAPTEST_BACKEND_URL}"
[alternatives]
type = "bank"
"#;

const SAMPLE_BANK: &str = r#"# Java fundamentals diagnostic, four questions per tier.

[[questions]]
id = 1
question = "What is a variable in programming?"
options = ["A value that never changes", "A memory space to store data", "A mathematical function", "A type of loop"]
correct_answer = 1
difficulty = "basic"
topic = "Variables"

[[questions]]
id = 2
question = "What is the correct syntax to declare a variable in Java?"
options = ["var x = 5;", "int x = 5;", "variable x = 5;", "declare int x = 5;"]
correct_answer = 1
difficulty = "basic"
topic = "Variables"

[[questions]]
id = 3
question = "Which type holds a true or false value in Java?"
options = ["int", "String", "boolean", "char"]
correct_answer = 2
difficulty = "basic"
topic = "Data Types"

[[questions]]
id = 4
question = "Which symbol ends a statement in Java?"
options = [":", ";", ".", ","]
correct_answer = 1
difficulty = "basic"
topic = "Syntax"

[[questions]]
id = 5
question = "What is a 'for' loop in programming?"
options = ["A data structure", "A control structure that repeats code", "A mathematical function", "A type of variable"]
correct_answer = 1
difficulty = "intermediate"
topic = "Loops"

[[questions]]
id = 6
question = "What is the difference between '==' and '.equals()' in Java?"
options = ["There is no difference", "== compares references, .equals() compares content", "== is faster than .equals()", ".equals() only works with numbers"]
correct_answer = 1
difficulty = "intermediate"
topic = "Operators"

[[questions]]
id = 7
question = "What is the index of the first element of a Java array?"
options = ["1", "-1", "0", "It depends on the array type"]
correct_answer = 2
difficulty = "intermediate"
topic = "Arrays"

[[questions]]
id = 8
question = "What does the 'break' statement do inside a loop?"
options = ["Skips to the next iteration", "Exits the loop immediately", "Restarts the loop", "Throws an exception"]
correct_answer = 1
difficulty = "intermediate"
topic = "Loops"

[[questions]]
id = 9
question = "What is time complexity O(n²) in algorithms?"
options = ["The algorithm takes constant time", "The time grows quadratically with input size", "The algorithm is linear", "The time cannot be determined"]
correct_answer = 1
difficulty = "advanced"
topic = "Algorithms"

[[questions]]
id = 10
question = "Which design pattern ensures a class has only one instance?"
options = ["Factory", "Observer", "Singleton", "Strategy"]
correct_answer = 2
difficulty = "advanced"
topic = "Design Patterns"

[[questions]]
id = 11
question = "What is the average lookup time of a HashMap?"
options = ["O(1)", "O(log n)", "O(n)", "O(n log n)"]
correct_answer = 0
difficulty = "advanced"
topic = "Algorithms"

[[questions]]
id = 12
question = "Which keyword prevents a method from being overridden?"
options = ["static", "private", "abstract", "final"]
correct_answer = 3
difficulty = "advanced"
topic = "Object-Oriented Programming"
"#;
