//! Module providing JSON IO for solverkit Models
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::io::IoError;
use crate::optimize::constraint::{Constraint, Relation};
use crate::optimize::error::SolverError;
use crate::optimize::expression::LinearExpression;
use crate::optimize::model::Model;
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::parameter::ParamValue;
use crate::optimize::variable::{VariableBuilder, VariableType};

// region JSON Model
/// Represents a JSON serialized model, used for reading and writing models in json format
///
/// JSON has no infinity, so infinite bounds and right hand sides are written as
/// the strings `"inf"` and `"-inf"`, see [`extended_float`].
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct JsonModel {
    name: String,
    sense: ObjectiveSense,
    objective: JsonExpression,
    variables: Vec<JsonVariable>,
    constraints: Vec<JsonConstraint>,
    #[serde(default)]
    parameters: IndexMap<String, ParamValue>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct JsonExpression {
    terms: IndexMap<String, f64>,
    #[serde(default)]
    constant: f64,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct JsonVariable {
    name: String,
    #[serde(rename = "type")]
    variable_type: VariableType,
    #[serde(with = "extended_float")]
    lower_bound: f64,
    #[serde(with = "extended_float")]
    upper_bound: f64,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct JsonConstraint {
    name: String,
    terms: IndexMap<String, f64>,
    relation: Relation,
    #[serde(with = "extended_float")]
    rhs: f64,
}

/// (De)serialize floats which may be infinite, as JSON numbers or `"inf"` / `"-inf"`
mod extended_float {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else if *value > 0.0 {
            serializer.serialize_str("inf")
        } else if *value < 0.0 {
            serializer.serialize_str("-inf")
        } else {
            serializer.serialize_str("nan")
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(value) => Ok(value),
            Repr::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "inf" | "+inf" | "infinity" => Ok(f64::INFINITY),
                "-inf" | "-infinity" => Ok(f64::NEG_INFINITY),
                "nan" => Ok(f64::NAN),
                other => Err(D::Error::custom(format!(
                    "expected a number, `inf` or `-inf`, got `{}`",
                    other
                ))),
            },
        }
    }
}
// endregion JSON Model

// region Conversions
impl From<&Model> for JsonModel {
    fn from(model: &Model) -> Self {
        let objective = model.objective().expression();
        JsonModel {
            name: model.name().to_string(),
            sense: model.sense(),
            objective: JsonExpression {
                terms: objective
                    .terms()
                    .map(|(name, coef)| (name.to_string(), coef))
                    .collect(),
                constant: objective.get_constant(),
            },
            variables: model
                .variables()
                .map(|var| JsonVariable {
                    name: var.name().to_string(),
                    variable_type: var.variable_type(),
                    lower_bound: var.lower_bound(),
                    upper_bound: var.upper_bound(),
                })
                .collect(),
            constraints: model
                .constraints()
                .map(|cons| JsonConstraint {
                    name: cons.name().to_string(),
                    terms: cons
                        .terms()
                        .map(|(name, coef)| (name.to_string(), coef))
                        .collect(),
                    relation: cons.relation(),
                    rhs: cons.rhs(),
                })
                .collect(),
            parameters: model.parameters().clone(),
        }
    }
}

impl TryFrom<JsonModel> for Model {
    type Error = SolverError;

    fn try_from(json: JsonModel) -> Result<Self, Self::Error> {
        let mut model = Model::new(json.name);
        for var in json.variables {
            let variable = VariableBuilder::default()
                .name(var.name)
                .variable_type(var.variable_type)
                .lower_bound(var.lower_bound)
                .upper_bound(var.upper_bound)
                .build()?;
            model.add_variable(variable)?;
        }
        for cons in json.constraints {
            let expression = cons.terms.into_iter().collect::<LinearExpression>();
            model.add_constraint(Constraint::new(
                cons.name,
                expression,
                cons.relation,
                cons.rhs,
            ))?;
        }
        let objective = json
            .objective
            .terms
            .into_iter()
            .collect::<LinearExpression>()
            + json.objective.constant;
        model.set_objective(objective, json.sense)?;
        for (name, value) in json.parameters {
            model.set_parameter(&name, value);
        }
        Ok(model)
    }
}
// endregion Conversions

// region Reading and Writing
/// Serialize a model to a JSON string
pub fn to_json_string(model: &Model) -> Result<String, SolverError> {
    Ok(serde_json::to_string_pretty(&JsonModel::from(model)).map_err(IoError::Serialize)?)
}

/// Deserialize a model from a JSON string
pub fn from_json_str(data: &str) -> Result<Model, SolverError> {
    let json: JsonModel = serde_json::from_str(data).map_err(IoError::Deserialize)?;
    Model::try_from(json)
}

/// Write a model to a JSON file
pub fn write_model<P: AsRef<Path>>(model: &Model, path: P) -> Result<(), SolverError> {
    let data = to_json_string(model)?;
    fs::write(path, data).map_err(IoError::Write)?;
    Ok(())
}

/// Read a model from a JSON file
pub fn read_model<P: AsRef<Path>>(path: P) -> Result<Model, SolverError> {
    let data = fs::read_to_string(path).map_err(IoError::Read)?;
    from_json_str(&data)
}
// endregion Reading and Writing

#[cfg(test)]
mod tests {
    use super::*;

    fn example_model() -> Model {
        let mut model = Model::new("marketing");
        for (name, kind, upper) in [
            ("tv", VariableType::Integer, 10.),
            ("radio", VariableType::Continuous, f64::INFINITY),
            ("web", VariableType::Binary, 1.),
        ] {
            model
                .add_variable(
                    VariableBuilder::default()
                        .name(name)
                        .variable_type(kind)
                        .upper_bound(upper)
                        .build()
                        .unwrap(),
                )
                .unwrap();
        }
        model
            .add_new_constraint(
                "budget",
                LinearExpression::from_terms(&[("tv", 300.), ("radio", 150.), ("web", 50.)]),
                Relation::LessEqual,
                2000.,
            )
            .unwrap();
        model
            .set_objective(
                LinearExpression::from_terms(&[("tv", 4.), ("radio", 2.), ("web", 1.)]) + 1.,
                ObjectiveSense::Maximize,
            )
            .unwrap();
        model.set_parameter("round_integers", ParamValue::Bool(false));
        model
    }

    #[test]
    fn infinite_bounds_are_signed_strings() {
        let data = to_json_string(&example_model()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&data).unwrap();
        assert_eq!(value["variables"][1]["upper_bound"], "inf");
        assert_eq!(value["variables"][1]["lower_bound"], 0.0);
        assert_eq!(value["variables"][0]["type"], "integer");
        assert_eq!(value["constraints"][0]["relation"], "<=");
        assert_eq!(value["sense"], "maximize");
    }

    #[test]
    fn read_back_written_model() {
        let model = example_model();
        let path = std::env::temp_dir().join(format!("solverkit_json_{}.json", std::process::id()));
        write_model(&model, &path).unwrap();
        let read = read_model(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(read, model);
    }

    #[test]
    fn infinities_keep_their_sign() {
        let mut model = Model::new("infinities");
        for (name, lower, upper) in [
            ("free", f64::NEG_INFINITY, f64::INFINITY),
            ("stuck_high", f64::INFINITY, f64::INFINITY),
            ("stuck_low", f64::NEG_INFINITY, f64::NEG_INFINITY),
        ] {
            model
                .add_variable(
                    VariableBuilder::default()
                        .name(name)
                        .lower_bound(lower)
                        .upper_bound(upper)
                        .build()
                        .unwrap(),
                )
                .unwrap();
        }
        model
            .add_new_constraint(
                "below_everything",
                LinearExpression::from_terms(&[("free", 1.)]),
                Relation::LessEqual,
                f64::NEG_INFINITY,
            )
            .unwrap();
        model
            .add_new_constraint(
                "above_everything",
                LinearExpression::from_terms(&[("free", 1.)]),
                Relation::GreaterEqual,
                f64::INFINITY,
            )
            .unwrap();

        let data = to_json_string(&model).unwrap();
        let value: serde_json::Value = serde_json::from_str(&data).unwrap();
        assert_eq!(value["variables"][1]["lower_bound"], "inf");
        assert_eq!(value["variables"][2]["upper_bound"], "-inf");
        assert_eq!(value["constraints"][0]["rhs"], "-inf");
        assert_eq!(value["constraints"][1]["rhs"], "inf");

        let read = from_json_str(&data).unwrap();
        assert_eq!(read, model);
        assert_eq!(
            read.constraint("below_everything").unwrap().rhs(),
            f64::NEG_INFINITY
        );
        assert_eq!(read.variable("stuck_high").unwrap().lower_bound(), f64::INFINITY);
    }

    #[test]
    fn bad_bound_text() {
        let data = r#"{
            "name": "bad",
            "sense": "maximize",
            "objective": {"terms": {}},
            "variables": [
                {"name": "x", "type": "integer", "lower_bound": "lots", "upper_bound": 5}
            ],
            "constraints": []
        }"#;
        assert!(matches!(
            from_json_str(data),
            Err(SolverError::Io(IoError::Deserialize(_)))
        ));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let data = r#"{
            "name": "dup",
            "sense": "minimize",
            "objective": {"terms": {}},
            "variables": [
                {"name": "x", "type": "continuous", "lower_bound": 0, "upper_bound": "inf"},
                {"name": "x", "type": "integer", "lower_bound": 0, "upper_bound": 5}
            ],
            "constraints": []
        }"#;
        assert!(matches!(
            from_json_str(data),
            Err(SolverError::InvalidArgument(_))
        ));
    }

    #[test]
    fn malformed_json() {
        assert!(matches!(
            from_json_str("{ not json"),
            Err(SolverError::Io(IoError::Deserialize(_)))
        ));
    }
}
