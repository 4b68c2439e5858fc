use serde::Serialize;

/// One line of a recipe's ingredient list.
///
/// Amount and measure are kept as text so notations like "1/2" or
/// "to taste" survive a save unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Ingredient {
    pub amount: String,
    pub measure: String,
    pub name: String,
}

impl Ingredient {
    pub fn new(
        amount: impl Into<String>,
        measure: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Ingredient {
            amount: amount.into(),
            measure: measure.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Recipe {
    pub name: String,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<String>,
}

impl Recipe {
    pub fn new(name: impl Into<String>) -> Self {
        Recipe {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_ingredient(mut self, ingredient: Ingredient) -> Self {
        self.ingredients.push(ingredient);
        self
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instructions.push(instruction.into());
        self
    }
}
