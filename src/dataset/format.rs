use csv::StringRecord;

const SURVEY_COLUMNS: &[&str] = &[
    "LanguageWorkedWith",
    "LanguageDesireNextYear",
    "DatabaseWorkedWith",
    "DatabaseDesireNextYear",
];

const DESCRIPTION_COLUMNS: &[&str] = &["description", "Job Description", "Job_Description"];

/// Column layout of one source file, resolved once from its header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceFormat {
    /// Developer survey: technology columns joined into one text.
    Survey { columns: Vec<usize> },
    /// One free-text description column.
    TabularDescription { column: usize },
    /// Skill lists, optionally merged with a second skill column.
    MergedSkills {
        skills: usize,
        type_skills: Option<usize>,
    },
}

impl SourceFormat {
    pub fn detect(headers: &StringRecord) -> Option<Self> {
        let position = |name: &str| headers.iter().position(|h| h.trim() == name);

        let survey: Vec<usize> = SURVEY_COLUMNS.iter().filter_map(|&c| position(c)).collect();
        if !survey.is_empty() {
            return Some(Self::Survey { columns: survey });
        }

        if let Some(column) = DESCRIPTION_COLUMNS.iter().find_map(|&c| position(c)) {
            return Some(Self::TabularDescription { column });
        }

        position("job_skills").map(|skills| Self::MergedSkills {
            skills,
            type_skills: position("job_type_skills"),
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Survey { .. } => "survey",
            Self::TabularDescription { .. } => "tabular description",
            Self::MergedSkills { .. } => "merged skills",
        }
    }

    /// Builds the description text for one row. A blank cell in a lone
    /// description or `job_skills` column yields `None`; joined formats
    /// treat blank cells as empty.
    pub fn description(&self, record: &StringRecord) -> Option<String> {
        let cell = |i: usize| record.get(i).unwrap_or("");

        match self {
            Self::Survey { columns } => Some(
                columns
                    .iter()
                    .map(|&i| cell(i))
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
            Self::TabularDescription { column: single }
            | Self::MergedSkills {
                skills: single,
                type_skills: None,
            } => {
                let text = cell(*single);
                (!text.trim().is_empty()).then(|| text.to_string())
            }
            Self::MergedSkills {
                skills,
                type_skills: Some(extra),
            } => Some(format!("{} {}", cell(*skills), cell(*extra))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> StringRecord {
        StringRecord::from(names.to_vec())
    }

    #[test]
    fn test_detect_survey_uses_present_columns() {
        let format = SourceFormat::detect(&headers(&[
            "Respondent",
            "LanguageWorkedWith",
            "DatabaseWorkedWith",
            "description",
        ]))
        .unwrap();
        assert_eq!(format, SourceFormat::Survey { columns: vec![1, 2] });

        let row = StringRecord::from(vec!["1", "Python;SQL", "", "ignored"]);
        assert_eq!(format.description(&row), Some("Python;SQL ".to_string()));
    }

    #[test]
    fn test_detect_description_column_priority() {
        let format =
            SourceFormat::detect(&headers(&["title", "Job_Description", "Job Description"])).unwrap();
        assert_eq!(format, SourceFormat::TabularDescription { column: 2 });

        let blank = StringRecord::from(vec!["dev", "x", "  "]);
        assert_eq!(format.description(&blank), None);
    }

    #[test]
    fn test_detect_merged_skills() {
        let format = SourceFormat::detect(&headers(&["job_skills", "job_type_skills"])).unwrap();
        assert_eq!(
            format,
            SourceFormat::MergedSkills {
                skills: 0,
                type_skills: Some(1)
            }
        );
        let row = StringRecord::from(vec!["python, sql", "aws"]);
        assert_eq!(format.description(&row), Some("python, sql aws".to_string()));

        let single = SourceFormat::detect(&headers(&["job_skills"])).unwrap();
        assert_eq!(
            single,
            SourceFormat::MergedSkills {
                skills: 0,
                type_skills: None
            }
        );
        let row = StringRecord::from(vec!["docker"]);
        assert_eq!(single.description(&row), Some("docker".to_string()));
    }

    #[test]
    fn test_blank_skills_cell_is_dropped_unless_merged() {
        let single = SourceFormat::detect(&headers(&["job_skills"])).unwrap();
        assert_eq!(single.description(&StringRecord::from(vec![" "])), None);
        assert_eq!(single.description(&StringRecord::from(vec![""])), None);

        let merged = SourceFormat::detect(&headers(&["job_skills", "job_type_skills"])).unwrap();
        let row = StringRecord::from(vec!["", ""]);
        assert_eq!(merged.description(&row), Some(" ".to_string()));
    }

    #[test]
    fn test_unknown_layout_is_rejected() {
        assert!(SourceFormat::detect(&headers(&["title", "salary"])).is_none());
    }
}
