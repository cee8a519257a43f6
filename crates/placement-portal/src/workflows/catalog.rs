use serde::Serialize;

/// Company a student can submit a resume to, with its open roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Company {
    pub id: &'static str,
    pub name: &'static str,
    pub roles: &'static [&'static str],
}

const STUDENT_COMPANIES: &[Company] = &[
    Company {
        id: "1",
        name: "TCS",
        roles: &["Software Developer", "System Engineer"],
    },
    Company {
        id: "2",
        name: "Infosys",
        roles: &["Associate Consultant", "Developer"],
    },
    Company {
        id: "3",
        name: "Wipro",
        roles: &["Project Engineer", "Analyst"],
    },
    Company {
        id: "4",
        name: "Microsoft",
        roles: &["Software Engineer", "Program Manager"],
    },
    Company {
        id: "5",
        name: "Amazon",
        roles: &["SDE I", "Business Analyst"],
    },
];

const PLACEMENT_COMPANIES: &[&str] = &[
    "TCS",
    "Infosys",
    "Wipro",
    "Microsoft",
    "Amazon",
    "Google",
    "IBM",
    "Accenture",
];

/// Read-only company reference data.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompanyCatalog;

impl CompanyCatalog {
    pub fn student_companies(&self) -> &'static [Company] {
        STUDENT_COMPANIES
    }

    pub fn placement_companies(&self) -> &'static [&'static str] {
        PLACEMENT_COMPANIES
    }

    pub fn find(&self, id: &str) -> Option<&'static Company> {
        STUDENT_COMPANIES.iter().find(|company| company.id == id)
    }
}
