//! The section-tagged line format recipes are stored in.
//!
//! ```text
//! [Recept]
//! Pancakes
//! [Ingredienser]
//! 2;dl;flour
//! [Instruktioner]
//! Mix ingredients.
//! ```
//!
//! Blank lines are ignored on read and never written.

use std::io::{self, BufRead, Write};

use log::debug;

use crate::error::StoreError;
use crate::model::{Ingredient, Recipe};

pub const RECIPE_MARKER: &str = "[Recept]";
pub const INGREDIENTS_MARKER: &str = "[Ingredienser]";
pub const INSTRUCTIONS_MARKER: &str = "[Instruktioner]";

const INGREDIENT_SEPARATOR: char = ';';

#[cfg(windows)]
const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
const LINE_ENDING: &str = "\n";

/// How content lines are interpreted, switched by marker lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Indefinite,
    /// `named` stays false until the marker has been followed by a name line.
    NewRecipe { named: bool },
    Ingredient,
    Instruction,
}

impl Section {
    fn from_marker(line: &str) -> Option<Self> {
        match line {
            RECIPE_MARKER => Some(Section::NewRecipe { named: false }),
            INGREDIENTS_MARKER => Some(Section::Ingredient),
            INSTRUCTIONS_MARKER => Some(Section::Instruction),
            _ => None,
        }
    }

    fn awaiting_name(self) -> bool {
        self == Section::NewRecipe { named: false }
    }
}

/// Parse every recipe in `reader`, in file order.
///
/// Fails on the first line that violates the grammar; nothing parsed so
/// far is returned in that case.
pub fn parse<R: BufRead>(reader: R) -> Result<Vec<Recipe>, StoreError> {
    let mut recipes = Vec::new();
    let mut section = Section::Indefinite;
    let mut line_no = 0;

    for line in reader.lines() {
        let line = line?;
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        section = advance(section, &line, line_no, &mut recipes)?;
    }

    if section.awaiting_name() {
        return Err(StoreError::format(
            line_no,
            "recipe marker without a name at end of file",
        ));
    }

    debug!("Parsed {} recipes from {} lines", recipes.len(), line_no);
    Ok(recipes)
}

fn advance(
    section: Section,
    line: &str,
    line_no: usize,
    recipes: &mut Vec<Recipe>,
) -> Result<Section, StoreError> {
    if let Some(next) = Section::from_marker(line) {
        if section.awaiting_name() {
            return Err(StoreError::format(
                line_no,
                format!("recipe marker without a name before '{}'", line),
            ));
        }
        return Ok(next);
    }

    match section {
        Section::Indefinite => Err(StoreError::format(
            line_no,
            "content before any section marker",
        )),
        Section::NewRecipe { .. } => {
            recipes.push(Recipe::new(line));
            Ok(Section::NewRecipe { named: true })
        }
        Section::Ingredient => {
            let ingredient = parse_ingredient(line, line_no)?;
            current_recipe(recipes, line_no)?
                .ingredients
                .push(ingredient);
            Ok(section)
        }
        Section::Instruction => {
            current_recipe(recipes, line_no)?
                .instructions
                .push(line.to_string());
            Ok(section)
        }
    }
}

fn parse_ingredient(line: &str, line_no: usize) -> Result<Ingredient, StoreError> {
    let fields: Vec<&str> = line.split(INGREDIENT_SEPARATOR).collect();
    match fields.as_slice() {
        [amount, measure, name] => Ok(Ingredient::new(*amount, *measure, *name)),
        _ => Err(StoreError::format(
            line_no,
            format!(
                "expected 3 '{}'-separated ingredient fields, found {}",
                INGREDIENT_SEPARATOR,
                fields.len()
            ),
        )),
    }
}

fn current_recipe(recipes: &mut [Recipe], line_no: usize) -> Result<&mut Recipe, StoreError> {
    recipes
        .last_mut()
        .ok_or_else(|| StoreError::format(line_no, "content before any recipe"))
}

/// Write `recipes` in the given order. Values are not checked here; run
/// [`validate`] first when the output has to load back unchanged.
pub fn write<W: Write>(mut writer: W, recipes: &[Recipe]) -> io::Result<()> {
    for recipe in recipes {
        write_line(&mut writer, RECIPE_MARKER)?;
        write_line(&mut writer, &recipe.name)?;

        write_line(&mut writer, INGREDIENTS_MARKER)?;
        for ingredient in &recipe.ingredients {
            write!(
                writer,
                "{}{sep}{}{sep}{}{}",
                ingredient.amount,
                ingredient.measure,
                ingredient.name,
                LINE_ENDING,
                sep = INGREDIENT_SEPARATOR
            )?;
        }

        write_line(&mut writer, INSTRUCTIONS_MARKER)?;
        for instruction in &recipe.instructions {
            write_line(&mut writer, instruction)?;
        }
    }
    writer.flush()
}

fn write_line<W: Write>(writer: &mut W, line: &str) -> io::Result<()> {
    writer.write_all(line.as_bytes())?;
    writer.write_all(LINE_ENDING.as_bytes())
}

/// Check that `recipe` survives a write followed by a parse.
///
/// The format has no escaping, so ingredient fields may not contain `;`,
/// no value may span lines, and names and instructions must be neither
/// blank nor a section marker.
pub fn validate(recipe: &Recipe) -> Result<(), StoreError> {
    let fail = |reason: String| StoreError::EncodeError {
        recipe: recipe.name.clone(),
        reason,
    };

    check_text_line(&recipe.name, "name").map_err(fail)?;

    for ingredient in &recipe.ingredients {
        for field in [&ingredient.amount, &ingredient.measure, &ingredient.name] {
            if field.contains(INGREDIENT_SEPARATOR) {
                return Err(fail(format!(
                    "ingredient field '{}' contains '{}'",
                    field, INGREDIENT_SEPARATOR
                )));
            }
            if has_line_break(field) {
                return Err(fail(format!(
                    "ingredient field '{}' contains a line break",
                    field.escape_debug()
                )));
            }
        }
    }

    for (index, instruction) in recipe.instructions.iter().enumerate() {
        check_text_line(instruction, &format!("instruction {}", index + 1)).map_err(fail)?;
    }

    Ok(())
}

fn check_text_line(value: &str, what: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} is blank", what))
    } else if has_line_break(value) {
        Err(format!("{} contains a line break", what))
    } else if Section::from_marker(value).is_some() {
        Err(format!("{} is the section marker '{}'", what, value))
    } else {
        Ok(())
    }
}

fn has_line_break(value: &str) -> bool {
    value.contains(['\n', '\r'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse_str(text: &str) -> Result<Vec<Recipe>, StoreError> {
        parse(Cursor::new(text))
    }

    fn format_line(err: StoreError) -> usize {
        match err {
            StoreError::FormatError { line, .. } => line,
            other => panic!("Expected format error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_pancakes() {
        let text = "[Recept]\nPancakes\n[Ingredienser]\n2;dl;flour\n3;st;eggs\n[Instruktioner]\nMix ingredients.\nFry on pan.\n";
        let recipes = parse_str(text).unwrap();

        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].name, "Pancakes");
        assert_eq!(
            recipes[0].ingredients,
            vec![
                Ingredient::new("2", "dl", "flour"),
                Ingredient::new("3", "st", "eggs"),
            ]
        );
        assert_eq!(recipes[0].instructions, vec!["Mix ingredients.", "Fry on pan."]);
    }

    #[test]
    fn test_parse_keeps_file_order() {
        let text = "[Recept]\nTea\n[Recept]\nApple Pie\n";
        let recipes = parse_str(text).unwrap();

        let names: Vec<_> = recipes.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Tea", "Apple Pie"]);
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let text = "\n[Recept]\n\nSoup\n   \n[Ingredienser]\n\n1;l;water\n\n[Instruktioner]\n\nBoil.\n\n";
        let recipes = parse_str(text).unwrap();

        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].ingredients.len(), 1);
        assert_eq!(recipes[0].instructions, vec!["Boil."]);
    }

    #[test]
    fn test_crlf_line_endings() {
        let text = "[Recept]\r\nSoup\r\n[Ingredienser]\r\n1;l;water\r\n";
        let recipes = parse_str(text).unwrap();

        assert_eq!(recipes[0].name, "Soup");
        assert_eq!(recipes[0].ingredients[0].name, "water");
    }

    #[test]
    fn test_each_name_line_starts_a_recipe() {
        let text = "[Recept]\nToast\nTea\n[Instruktioner]\nSteep.\n";
        let recipes = parse_str(text).unwrap();

        assert_eq!(recipes.len(), 2);
        assert!(recipes[0].instructions.is_empty());
        assert_eq!(recipes[1].instructions, vec!["Steep."]);
    }

    #[test]
    fn test_empty_fields_and_free_text_amounts() {
        let text = "[Recept]\nSoup\n[Ingredienser]\n;;salt\nto taste;;pepper\n1/2;dl;cream\n";
        let recipes = parse_str(text).unwrap();

        assert_eq!(
            recipes[0].ingredients,
            vec![
                Ingredient::new("", "", "salt"),
                Ingredient::new("to taste", "", "pepper"),
                Ingredient::new("1/2", "dl", "cream"),
            ]
        );
    }

    #[test]
    fn test_fields_are_not_trimmed() {
        let recipes = parse_str("[Recept]\nSoup\n[Ingredienser]\n 1 ; dl ; milk \n").unwrap();
        assert_eq!(recipes[0].ingredients[0], Ingredient::new(" 1 ", " dl ", " milk "));
    }

    #[test]
    fn test_instruction_kept_verbatim() {
        let recipes =
            parse_str("[Recept]\nSoup\n[Instruktioner]\n  Stir; then serve.\n").unwrap();
        assert_eq!(recipes[0].instructions, vec!["  Stir; then serve."]);
    }

    #[test]
    fn test_empty_input_is_valid() {
        assert!(parse_str("").unwrap().is_empty());
        assert!(parse_str("\n\n  \n").unwrap().is_empty());
    }

    #[test]
    fn test_wrong_field_count_is_format_error() {
        let two = parse_str("[Recept]\nSoup\n[Ingredienser]\n1;water\n").unwrap_err();
        assert_eq!(format_line(two), 4);

        let four = parse_str("[Recept]\nSoup\n[Ingredienser]\n1;l;water;cold\n").unwrap_err();
        assert_eq!(format_line(four), 4);
    }

    #[test]
    fn test_content_before_marker_is_format_error() {
        let err = parse_str("\nSoup\n[Recept]\nTea\n").unwrap_err();
        assert_eq!(format_line(err), 2);
    }

    #[test]
    fn test_ingredient_without_recipe_is_format_error() {
        let err = parse_str("[Ingredienser]\n1;l;water\n").unwrap_err();
        assert_eq!(format_line(err), 2);

        let err = parse_str("[Instruktioner]\nBoil.\n").unwrap_err();
        assert_eq!(format_line(err), 2);
    }

    #[test]
    fn test_marker_without_name_is_format_error() {
        let err = parse_str("[Recept]\nSoup\n[Recept]\n[Ingredienser]\n1;l;water\n").unwrap_err();
        assert_eq!(format_line(err), 4);

        let err = parse_str("[Recept]\nSoup\n[Recept]\n\n").unwrap_err();
        assert!(matches!(err, StoreError::FormatError { .. }));
    }

    #[test]
    fn test_markers_must_match_whole_line() {
        let recipes = parse_str("[Recept]\n[Recept] extra\n").unwrap();
        assert_eq!(recipes[0].name, "[Recept] extra");
    }

    #[test]
    fn test_write_layout() {
        let recipes = vec![
            Recipe::new("Pancakes")
                .with_ingredient(Ingredient::new("2", "dl", "flour"))
                .with_instruction("Mix."),
            Recipe::new("Tea"),
        ];
        let mut out = Vec::new();
        write(&mut out, &recipes).unwrap();

        let expected = [
            "[Recept]",
            "Pancakes",
            "[Ingredienser]",
            "2;dl;flour",
            "[Instruktioner]",
            "Mix.",
            "[Recept]",
            "Tea",
            "[Ingredienser]",
            "[Instruktioner]",
        ]
        .iter()
        .map(|line| format!("{}{}", line, LINE_ENDING))
        .collect::<String>();

        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn test_write_then_parse() {
        let recipes = vec![Recipe::new("Soup")
            .with_ingredient(Ingredient::new("", "", "salt"))
            .with_ingredient(Ingredient::new("1/2", "dl", "cream"))
            .with_instruction("Boil.")
            .with_instruction("Serve hot.")];
        let mut out = Vec::new();
        write(&mut out, &recipes).unwrap();

        assert_eq!(parse(Cursor::new(out)).unwrap(), recipes);
    }

    #[test]
    fn test_validate_accepts_plain_recipe() {
        let recipe = Recipe::new("Soup")
            .with_ingredient(Ingredient::new("", "", "salt"))
            .with_instruction("Stir; then serve.");
        assert!(validate(&recipe).is_ok());
    }

    #[test]
    fn test_validate_rejects_separator_in_ingredient() {
        let recipe = Recipe::new("Soup").with_ingredient(Ingredient::new("1", "dl", "a;b"));
        assert!(matches!(
            validate(&recipe),
            Err(StoreError::EncodeError { recipe, .. }) if recipe == "Soup"
        ));
    }

    #[test]
    fn test_validate_rejects_unrepresentable_lines() {
        assert!(validate(&Recipe::new("  ")).is_err());
        assert!(validate(&Recipe::new("Two\nlines")).is_err());
        assert!(validate(&Recipe::new(INGREDIENTS_MARKER)).is_err());
        assert!(validate(&Recipe::new("Soup").with_instruction("")).is_err());
        assert!(validate(&Recipe::new("Soup").with_instruction(RECIPE_MARKER)).is_err());
        assert!(validate(
            &Recipe::new("Soup").with_ingredient(Ingredient::new("1\r", "dl", "milk"))
        )
        .is_err());
    }
}
