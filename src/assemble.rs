//! Document field assembly for accident investigations.
//!
//! [`Assembler::assemble`] loads an investigation and every record around
//! it, then computes the flat placeholder map and the sources of each
//! repeating segment. [`generate`] runs the whole pipeline: assemble, bind
//! and merge every segment, finalize.
//!
//! A build is a single pass. Any error aborts it and nothing is retried.

use std::collections::HashSet;
use std::path::PathBuf;

use jiff::Timestamp;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{BuildError, Result};
use crate::fetch::EntityStore;
use crate::format::{
    DateStyle, Locale, ZERO_PLACEHOLDER, capitalize, format_date, format_days_between,
    format_price, format_since, person_name, thumb_name,
};
use crate::model::{
    AccidentLocation, AccidentRecord, Attendance, BranchRole, DigiriskElement, EntityId,
    PlaceholderMap, Risk, Signatory, TaskNode, TaskTree, UnixTime,
};
use crate::segment::{SegmentBinding, bind_segment, merge_segment};
use crate::template::{BuiltDocument, TemplateEngine};

/// Region holding one row per signatory.
pub const ATTENDANT_TAG: &str = "attendant";

/// Cotation levels, each rendered in its own `risq{level}` region.
const RISK_LEVELS: [u8; 4] = [1, 2, 3, 4];

/// A risk along with the element it was assessed on.
#[derive(Debug, Clone)]
pub struct ElementRisk {
    pub element: String,
    pub risk: Risk,
}

/// The data behind one repeating region.
#[derive(Debug, Clone)]
pub enum SegmentSource {
    /// Direct children of one action branch.
    Tasks {
        role: BranchRole,
        tasks: Vec<TaskNode>,
    },

    /// Everyone who attended or signed.
    Attendants(Vec<Signatory>),

    /// Risks of one cotation level, highest cotation first.
    Risks { level: u8, risks: Vec<ElementRisk> },
}

impl SegmentSource {
    /// Template region name.
    pub fn tag(&self) -> String {
        match self {
            Self::Tasks { role, .. } => role.segment_tag().to_string(),
            Self::Attendants(_) => ATTENDANT_TAG.to_string(),
            Self::Risks { level, .. } => format!("risq{level}"),
        }
    }
}

/// Everything computed for one document.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub fields: PlaceholderMap,
    pub segments: Vec<SegmentSource>,
    pub images: Vec<PathBuf>,
}

/// Computes document fields from an investigation and its related records.
pub struct Assembler<'a, S: EntityStore + ?Sized> {
    store: &'a S,
    config: &'a Config,
    locale: &'a Locale,
    now: UnixTime,
}

impl<'a, S: EntityStore + ?Sized> Assembler<'a, S> {
    pub fn new(store: &'a S, config: &'a Config, locale: &'a Locale, now: Timestamp) -> Self {
        Self {
            store,
            config,
            locale,
            now: now.as_second(),
        }
    }

    /// Load an investigation and compute its fields and segment sources.
    pub fn assemble(&self, investigation_id: EntityId) -> Result<Assembly> {
        let l = self.locale;
        let investigation = self.store.investigation(investigation_id)?;
        let accident = self.store.accident(investigation.fk_accident)?;
        let victim = self.store.user(accident.fk_user_victim)?;
        let metadata = self.store.accident_metadata(accident.id)?;
        let signatories = self.store.signatories(investigation.id)?;

        let root = self.store.task(investigation.fk_task)?;
        let tree = TaskTree::new(root, self.store.child_tasks(investigation.fk_task)?)?;
        let curative = self
            .store
            .child_tasks(tree.branch(BranchRole::Curative).id)?;
        let preventive = self
            .store
            .child_tasks(tree.branch(BranchRole::Preventive).id)?;
        let total_budget = self.subtree_budget(tree.root())?;

        let mut fields = PlaceholderMap::new();

        fields.insert(
            "investigation_date_start",
            format_date(investigation.date_start, DateStyle::DayHour, l),
        );
        fields.insert(
            "investigation_date_end",
            format_date(investigation.date_end, DateStyle::DayHour, l),
        );
        fields.insert("total_curative_action", count_or_zero(curative.len()));
        fields.insert("total_preventive_action", count_or_zero(preventive.len()));
        fields.insert("total_planned_budget", format_price(total_budget, l));
        fields.insert("attendants_number", count_or_zero(signatories.len()));

        let company = &self.config.company;
        fields.insert("mycompany_siret", company.siret.as_str());
        fields.insert("mycompany_contact", company.managers.as_str());
        fields.insert("mycompany_mail", company.email.as_str());

        fields.insert("victim_lastname", victim.lastname.to_uppercase());
        fields.insert("victim_firstname", capitalize(&victim.firstname));
        fields.insert(
            "seniority_at_post",
            format_since(investigation.seniority_at_post, self.now, l),
        );
        fields.insert(
            "victim_date_employment",
            format_since(victim.date_employment, self.now, l),
        );

        fields.insert(
            "accident_date",
            format_date(accident.accident_date, DateStyle::Day, l),
        );
        fields.insert(
            "accident_hour",
            format_date(accident.accident_date, DateStyle::Hour, l),
        );
        fields.insert(
            "accident_day",
            format_date(accident.accident_date, DateStyle::Weekday, l),
        );

        let (gp_ut, element) = self.resolve_location(&accident)?;
        fields.insert("gp_ut", gp_ut);

        fields.insert("victim_skills", investigation.victim_skills.as_str());
        fields.insert(
            "collective_equipment",
            investigation.collective_equipment.as_str(),
        );
        fields.insert(
            "individual_equipment",
            investigation.individual_equipment.as_str(),
        );
        fields.insert("circumstances", investigation.circumstances.as_str());
        fields.insert("public_note", investigation.note_public.as_str());
        fields.insert(
            "relative_location",
            metadata.map(|m| m.relative_location).unwrap_or_default(),
        );

        let mut images = Vec::new();
        match investigation
            .causality_tree
            .as_deref()
            .filter(|f| !f.is_empty())
        {
            Some(file) => {
                let path = self
                    .config
                    .output_dir
                    .join("accident_investigation")
                    .join(&investigation.reference)
                    .join("causality_tree")
                    .join("thumbs")
                    .join(thumb_name(file, "medium"));
                fields.insert("causality_tree_photo", path.display().to_string());
                images.push(path);
            }
            None => fields.insert("causality_tree_photo", ""),
        }

        let risks = match &element {
            Some(element) => self.element_risks(element)?,
            None => Vec::new(),
        };

        let mut segments = vec![SegmentSource::Attendants(signatories)];
        segments.extend(RISK_LEVELS.iter().map(|&level| SegmentSource::Risks {
            level,
            risks: risks
                .iter()
                .filter(|r| r.risk.level() == level)
                .cloned()
                .collect(),
        }));
        segments.push(SegmentSource::Tasks {
            role: BranchRole::Curative,
            tasks: curative,
        });
        segments.push(SegmentSource::Tasks {
            role: BranchRole::Preventive,
            tasks: preventive,
        });

        Ok(Assembly {
            fields,
            segments,
            images,
        })
    }

    /// Bind one segment's rows against the template.
    pub fn bind<E>(&self, engine: &E, source: &SegmentSource) -> Result<SegmentBinding>
    where
        E: TemplateEngine + ?Sized,
    {
        let tag = source.tag();
        match source {
            SegmentSource::Tasks { tasks, .. } => bind_segment(
                engine,
                &tag,
                tasks,
                task_fields(&tag, ["", "", "", "", ""]),
                |task| self.task_row(&tag, task),
            ),
            SegmentSource::Attendants(signatories) => bind_segment(
                engine,
                &tag,
                signatories,
                attendant_fields(["", "", "", "", "", ""]),
                |signatory| Ok(self.attendant_row(signatory)),
            ),
            SegmentSource::Risks { risks, .. } => bind_segment(
                engine,
                &tag,
                risks,
                risk_fields(["", "", "", "", ""]),
                |risk| Ok(risk_row(risk)),
            ),
        }
    }

    fn task_row(&self, tag: &str, task: &TaskNode) -> Result<PlaceholderMap> {
        let responsible = match task.executive() {
            Some(user) => {
                let user = self.store.user(user)?;
                person_name(&user.lastname, &user.firstname)
            }
            None => String::new(),
        };
        let delay = format_days_between(self.now, task.due_date, self.locale);
        let budget = format_price(task.budget, self.locale);

        Ok(task_fields(
            tag,
            [
                &task.reference,
                &task.description,
                &responsible,
                &delay,
                &budget,
            ],
        ))
    }

    fn attendant_row(&self, signatory: &Signatory) -> PlaceholderMap {
        let words = self.locale.words();
        let attendance = match signatory.attendance {
            Attendance::Present => words.attendance[0],
            Attendance::Delayed => words.attendance[1],
            Attendance::Absent => words.attendance[2],
        };
        attendant_fields([
            &signatory.lastname.to_uppercase(),
            &capitalize(&signatory.firstname),
            &signatory.job,
            &signatory.role,
            &format_date(signatory.signature_date, DateStyle::DayHour, self.locale),
            attendance,
        ])
    }

    /// The `gp_ut` text for an accident's location, plus the element when
    /// the accident is linked to one.
    fn resolve_location(
        &self,
        accident: &AccidentRecord,
    ) -> Result<(String, Option<DigiriskElement>)> {
        match accident.location() {
            AccidentLocation::Element(id) => {
                let element = self.store.element(id)?;
                let text = format!("{} - {}", element.reference, element.label);
                Ok((text, Some(element)))
            }
            AccidentLocation::Standard(id) => {
                let standard = self.store.standard(id)?;
                let text = format!("{} - {}", standard.reference, self.config.company.name);
                Ok((text, None))
            }
            AccidentLocation::Company(id) => {
                if accident.fk_element > 0 || accident.fk_standard > 0 {
                    debug!(
                        accident = accident.id,
                        "external accident, ignoring element and standard links"
                    );
                }
                Ok((self.store.company(id)?.name, None))
            }
            AccidentLocation::FreeText(text) => Ok((text, None)),
        }
    }

    /// Budget of `root` and every task below it.
    fn subtree_budget(&self, root: &TaskNode) -> Result<Decimal> {
        let mut total = Decimal::ZERO;
        let mut seen = HashSet::new();
        let mut pending = vec![root.clone()];

        while let Some(task) = pending.pop() {
            if !seen.insert(task.id) {
                return Err(BuildError::StructuralInvariant {
                    task_id: root.id,
                    reason: format!("task {} is reachable twice", task.id),
                });
            }
            total += task.budget;
            pending.extend(self.store.child_tasks(task.id)?);
        }

        Ok(total)
    }

    /// Risks shown for an element, highest cotation first.
    ///
    /// Always the element and its descendants. Ancestors and shared risks
    /// are added when the configuration asks for them.
    fn element_risks(&self, element: &DigiriskElement) -> Result<Vec<ElementRisk>> {
        let mut elements = Vec::new();
        let mut seen = HashSet::new();
        let mut pending = vec![element.clone()];
        while let Some(e) = pending.pop() {
            if !seen.insert(e.id) {
                continue;
            }
            pending.extend(self.store.element_children(e.id)?);
            elements.push(e);
        }

        if self.config.risks.show_inherited {
            let mut parent = element.parent;
            while let Some(id) = parent.filter(|id| *id > 0) {
                if !seen.insert(id) {
                    break;
                }
                let ancestor = self.store.element(id)?;
                parent = ancestor.parent;
                elements.push(ancestor);
            }
        }

        let mut risks = Vec::new();
        for e in &elements {
            let label = format!("{} - {}", e.reference, e.label);
            risks.extend(
                self.store
                    .risks_of_element(e.id)?
                    .into_iter()
                    .map(|risk| ElementRisk {
                        element: label.clone(),
                        risk,
                    }),
            );
        }

        if self.config.risks.show_shared {
            let mut taken: HashSet<EntityId> = risks.iter().map(|r| r.risk.id).collect();
            for e in &elements {
                for risk in self.store.shared_risks_of_element(e.id)? {
                    if !taken.insert(risk.id) {
                        continue;
                    }
                    let owner = self.store.element(risk.fk_element)?;
                    risks.push(ElementRisk {
                        element: format!("{} - {}", owner.reference, owner.label),
                        risk,
                    });
                }
            }
        }

        risks.sort_by(|a, b| b.risk.cotation.cmp(&a.risk.cotation));
        Ok(risks)
    }
}

/// Build a document end to end.
///
/// Assembles the investigation's fields, binds and merges every segment
/// the template defines, then finalizes. Fails on the first error.
pub fn generate<S, E>(
    store: &S,
    engine: &mut E,
    config: &Config,
    locale: &Locale,
    now: Timestamp,
    investigation: EntityId,
) -> Result<BuiltDocument>
where
    S: EntityStore + ?Sized,
    E: TemplateEngine + ?Sized,
{
    let assembler = Assembler::new(store, config, locale, now);
    let assembly = assembler.assemble(investigation)?;

    for source in &assembly.segments {
        let binding = assembler.bind(&*engine, source)?;
        merge_segment(engine, &source.tag(), &binding)?;
    }

    let document = engine
        .finalize(&assembly.fields, &assembly.images)
        .map_err(BuildError::Finalize)?;
    info!(investigation, document = %document.id, "document built");
    Ok(document)
}

fn count_or_zero(count: usize) -> String {
    if count > 0 {
        count.to_string()
    } else {
        ZERO_PLACEHOLDER.to_string()
    }
}

fn task_fields(tag: &str, [reference, description, resp, delay, budget]: [&str; 5]) -> PlaceholderMap {
    [
        (format!("{tag}_ref"), reference),
        (format!("{tag}_description"), description),
        (format!("{tag}_resp"), resp),
        (format!("{tag}_delay"), delay),
        (format!("{tag}_budget"), budget),
    ]
    .into_iter()
    .collect()
}

fn attendant_fields(
    [lastname, firstname, job, role, date, attendance]: [&str; 6],
) -> PlaceholderMap {
    [
        ("attendant_lastname", lastname),
        ("attendant_firstname", firstname),
        ("attendant_job", job),
        ("attendant_role", role),
        ("attendant_signature_date", date),
        ("attendant_attendance", attendance),
    ]
    .into_iter()
    .collect()
}

fn risk_fields([element, reference, category, cotation, description]: [&str; 5]) -> PlaceholderMap {
    [
        ("risk_element", element),
        ("risk_ref", reference),
        ("risk_category", category),
        ("risk_cotation", cotation),
        ("risk_description", description),
    ]
    .into_iter()
    .collect()
}

fn risk_row(entry: &ElementRisk) -> PlaceholderMap {
    let risk = &entry.risk;
    risk_fields([
        &entry.element,
        &risk.reference,
        &risk.category,
        &risk.cotation.to_string(),
        &risk.description,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::str::FromStr;

    use jiff::tz::TimeZone;

    use crate::config::RiskVisibility;
    use crate::fetch::{SignatoryList, Snapshot};
    use crate::model::{
        AccidentMetadata, Company, ContactType, DigiriskStandard, EntityKind,
        InvestigationRecord, SegmentRowSet, TaskContact, User,
    };
    use crate::template::{RecordingEngine, TemplateError, TextTemplate};

    const DAY: i64 = 86_400;

    // 2023-11-14 22:13:20 UTC, a Tuesday.
    const ACCIDENT_AT: UnixTime = 1_700_000_000;
    const NOW: UnixTime = ACCIDENT_AT + 30 * DAY;

    fn now() -> Timestamp {
        Timestamp::from_second(NOW).unwrap()
    }

    fn locale() -> Locale {
        Locale::fr_fr(TimeZone::UTC)
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.output_dir = PathBuf::from("/srv/documents");
        config.company.name = "Evarisk".into();
        config.company.siret = "123 456 789 00010".into();
        config
    }

    fn task(id: EntityId, parent: EntityId, budget: &str) -> TaskNode {
        TaskNode {
            id,
            parent: Some(parent),
            reference: format!("T{id}"),
            description: format!("Action {id}"),
            budget: Decimal::from_str(budget).unwrap(),
            ..TaskNode::default()
        }
    }

    fn branch(id: EntityId, role: BranchRole) -> TaskNode {
        TaskNode {
            role: Some(role),
            ..task(id, 100, "0")
        }
    }

    fn executive(user: EntityId) -> Vec<TaskContact> {
        vec![TaskContact {
            user,
            kind: ContactType::TaskExecutive,
        }]
    }

    /// Three curative actions (one without an executive), no preventive
    /// ones, an accident at an external company.
    fn snapshot() -> Snapshot {
        let mut t111 = task(111, 101, "100");
        t111.contacts = executive(21);
        t111.due_date = NOW + 10 * DAY;
        let mut t112 = task(112, 101, "200");
        t112.contacts = executive(22);
        t112.due_date = NOW + DAY;
        let t113 = task(113, 101, "300");

        Snapshot {
            investigations: vec![InvestigationRecord {
                id: 1,
                reference: "AI0001".into(),
                fk_accident: 10,
                fk_task: 100,
                date_start: ACCIDENT_AT + DAY,
                date_end: ACCIDENT_AT + DAY + 3_600,
                circumstances: "Slipped on a wet floor.".into(),
                note_public: "Floor signage missing.".into(),
                causality_tree: Some("tree.png".into()),
                ..InvestigationRecord::default()
            }],
            accidents: vec![AccidentRecord {
                id: 10,
                reference: "ACC0010".into(),
                accident_date: ACCIDENT_AT,
                external_accident: 2,
                fk_soc: 50,
                fk_element: 99,
                fk_standard: 98,
                accident_location: "Somewhere".into(),
                fk_user_victim: 20,
            }],
            accident_metadata: vec![AccidentMetadata {
                fk_accident: 10,
                relative_location: "Near the loading bay".into(),
            }],
            users: vec![
                User {
                    id: 20,
                    lastname: "dupont".into(),
                    firstname: "jean".into(),
                    ..User::default()
                },
                User {
                    id: 21,
                    lastname: "martin".into(),
                    firstname: "paul".into(),
                    ..User::default()
                },
                User {
                    id: 22,
                    lastname: "Durand".into(),
                    firstname: "léa".into(),
                    ..User::default()
                },
            ],
            tasks: vec![
                TaskNode {
                    id: 100,
                    ..TaskNode::default()
                },
                branch(101, BranchRole::Curative),
                branch(102, BranchRole::Preventive),
                t111,
                t112,
                t113,
            ],
            companies: vec![Company {
                id: 50,
                name: "Acme Corp".into(),
            }],
            ..Snapshot::default()
        }
    }

    fn build(snapshot: &Snapshot, config: &Config) -> Result<RecordingEngine> {
        let mut engine = RecordingEngine::permissive();
        generate(snapshot, &mut engine, config, &locale(), now(), 1)?;
        Ok(engine)
    }

    fn assemble(snapshot: &Snapshot, config: &Config) -> Result<Assembly> {
        let locale = locale();
        Assembler::new(snapshot, config, &locale, now()).assemble(1)
    }

    #[test]
    fn curative_rows_and_blank_preventive_row() {
        let engine = build(&snapshot(), &config()).unwrap();

        let curative = engine.merged("cur_task").unwrap();
        assert_eq!(curative.len(), 3);
        let rows = curative.rows();
        assert_eq!(rows[0].get("cur_task_ref"), Some("T111"));
        assert_eq!(rows[0].get("cur_task_resp"), Some("MARTIN Paul"));
        assert_eq!(rows[0].get("cur_task_delay"), Some("10 Jours"));
        assert_eq!(rows[0].get("cur_task_budget"), Some("100,00"));
        assert_eq!(rows[1].get("cur_task_resp"), Some("DURAND Léa"));
        assert_eq!(rows[1].get("cur_task_delay"), Some("1 Jour"));
        assert_eq!(rows[2].get("cur_task_resp"), Some(""));
        assert_eq!(rows[2].get("cur_task_delay"), Some(""));
        assert_eq!(rows[2].get("cur_task_budget"), Some("300,00"));

        let preventive = engine.merged("prev_task").unwrap();
        assert_eq!(preventive.len(), 1);
        let blank = &preventive.rows()[0];
        assert_eq!(
            blank.keys().collect::<Vec<_>>(),
            [
                "prev_task_ref",
                "prev_task_description",
                "prev_task_resp",
                "prev_task_delay",
                "prev_task_budget"
            ]
        );
        assert!(blank.iter().all(|(_, v)| v.is_empty()));
    }

    #[test]
    fn aggregates() {
        let engine = build(&snapshot(), &config()).unwrap();
        let fields = engine.fields().unwrap();

        assert_eq!(fields.get("total_curative_action"), Some("3"));
        assert_eq!(fields.get("total_preventive_action"), Some("0 "));
        assert_eq!(fields.get("total_planned_budget"), Some("600,00"));
        assert_eq!(fields.get("attendants_number"), Some("0 "));
    }

    #[test]
    fn budget_covers_the_whole_subtree() {
        let mut snapshot = snapshot();
        snapshot.tasks[0].budget = Decimal::from(5);
        snapshot.tasks.push(task(121, 111, "1000.255"));

        let assembly = assemble(&snapshot, &config()).unwrap();
        assert_eq!(
            assembly.fields.get("total_planned_budget"),
            Some("1 605,26")
        );
        // Only direct children are rows and counted.
        assert_eq!(assembly.fields.get("total_curative_action"), Some("3"));
    }

    #[test]
    fn branch_counts_follow_direct_children() {
        let mut snapshot = snapshot();
        snapshot.tasks.push(task(131, 102, "10"));
        snapshot.tasks.push(task(132, 102, "20"));

        let engine = build(&snapshot, &config()).unwrap();
        let fields = engine.fields().unwrap();
        assert_eq!(fields.get("total_curative_action"), Some("3"));
        assert_eq!(fields.get("total_preventive_action"), Some("2"));
        assert_eq!(engine.merged("prev_task").unwrap().len(), 2);
    }

    #[test]
    fn root_without_two_branches_is_rejected() {
        let mut snapshot = snapshot();
        snapshot.tasks.retain(|t| t.id != 102);

        let err = assemble(&snapshot, &config()).unwrap_err();
        assert!(matches!(
            err,
            BuildError::StructuralInvariant { task_id: 100, .. }
        ));
    }

    #[test]
    fn victim_fields() {
        let assembly = assemble(&snapshot(), &config()).unwrap();
        let fields = &assembly.fields;

        assert_eq!(fields.get("victim_lastname"), Some("DUPONT"));
        assert_eq!(fields.get("victim_firstname"), Some("Jean"));
        assert_eq!(fields.get("victim_date_employment"), Some(""));
        assert_eq!(fields.get("seniority_at_post"), Some(""));
    }

    #[test]
    fn seniority_and_employment_when_set() {
        let mut snapshot = snapshot();
        snapshot.investigations[0].seniority_at_post = NOW - 400 * DAY;
        snapshot.users[0].date_employment = NOW - DAY;

        let assembly = assemble(&snapshot, &config()).unwrap();
        assert_eq!(
            assembly.fields.get("seniority_at_post"),
            Some("09/11/2022 - 400 Jours")
        );
        assert_eq!(
            assembly.fields.get("victim_date_employment"),
            Some("13/12/2023 - 1 Jour")
        );
    }

    #[test]
    fn accident_and_investigation_dates() {
        let assembly = assemble(&snapshot(), &config()).unwrap();
        let fields = &assembly.fields;

        assert_eq!(fields.get("accident_date"), Some("14/11/2023"));
        assert_eq!(fields.get("accident_hour"), Some("22:13"));
        assert_eq!(fields.get("accident_day"), Some("Mardi"));
        assert_eq!(
            fields.get("investigation_date_start"),
            Some("15/11/2023 22:13")
        );
        assert_eq!(
            fields.get("investigation_date_end"),
            Some("15/11/2023 23:13")
        );
    }

    #[test]
    fn external_company_location_ignores_element_and_standard() {
        // Element 99 and standard 98 aren't in the snapshot: resolving
        // either would fail the build.
        let assembly = assemble(&snapshot(), &config()).unwrap();
        assert_eq!(assembly.fields.get("gp_ut"), Some("Acme Corp"));
    }

    #[test]
    fn internal_element_location() {
        let mut snapshot = snapshot();
        snapshot.accidents[0].external_accident = 1;
        snapshot.accidents[0].fk_element = 5;
        snapshot.elements.push(DigiriskElement {
            id: 5,
            reference: "UT5".into(),
            label: "Atelier".into(),
            parent: None,
        });

        let assembly = assemble(&snapshot, &config()).unwrap();
        assert_eq!(assembly.fields.get("gp_ut"), Some("UT5 - Atelier"));
    }

    #[test]
    fn internal_standard_location_uses_company_name() {
        let mut snapshot = snapshot();
        snapshot.accidents[0].external_accident = 1;
        snapshot.accidents[0].fk_element = 0;
        snapshot.accidents[0].fk_standard = 3;
        snapshot.standards.push(DigiriskStandard {
            id: 3,
            reference: "DU1".into(),
        });

        let assembly = assemble(&snapshot, &config()).unwrap();
        assert_eq!(assembly.fields.get("gp_ut"), Some("DU1 - Evarisk"));
    }

    #[test]
    fn free_text_location() {
        let mut snapshot = snapshot();
        snapshot.accidents[0].external_accident = 3;

        let assembly = assemble(&snapshot, &config()).unwrap();
        assert_eq!(assembly.fields.get("gp_ut"), Some("Somewhere"));
    }

    #[test]
    fn narrative_and_company_fields_pass_through() {
        let assembly = assemble(&snapshot(), &config()).unwrap();
        let fields = &assembly.fields;

        assert_eq!(fields.get("circumstances"), Some("Slipped on a wet floor."));
        assert_eq!(fields.get("public_note"), Some("Floor signage missing."));
        assert_eq!(fields.get("victim_skills"), Some(""));
        assert_eq!(fields.get("relative_location"), Some("Near the loading bay"));
        assert_eq!(fields.get("mycompany_siret"), Some("123 456 789 00010"));
        assert_eq!(fields.get("mycompany_mail"), Some(""));
    }

    #[test]
    fn causality_tree_photo_path() {
        let assembly = assemble(&snapshot(), &config()).unwrap();
        let expected =
            PathBuf::from("/srv/documents/accident_investigation/AI0001/causality_tree/thumbs/tree_medium.png");

        assert_eq!(
            assembly.fields.get("causality_tree_photo"),
            Some(expected.display().to_string().as_str())
        );
        assert_eq!(assembly.images, [expected]);
    }

    #[test]
    fn no_causality_tree_means_no_image() {
        let mut snapshot = snapshot();
        snapshot.investigations[0].causality_tree = None;

        let assembly = assemble(&snapshot, &config()).unwrap();
        assert_eq!(assembly.fields.get("causality_tree_photo"), Some(""));
        assert!(assembly.images.is_empty());
    }

    #[test]
    fn missing_victim_aborts() {
        let mut snapshot = snapshot();
        snapshot.users.retain(|u| u.id != 20);

        let err = assemble(&snapshot, &config()).unwrap_err();
        assert!(matches!(
            err,
            BuildError::MissingEntity {
                kind: EntityKind::User,
                id: 20
            }
        ));
    }

    #[test]
    fn missing_investigation_aborts() {
        let err = Assembler::new(&snapshot(), &config(), &locale(), now())
            .assemble(404)
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::MissingEntity {
                kind: EntityKind::Investigation,
                id: 404
            }
        ));
    }

    #[test]
    fn missing_executive_fails_the_row() {
        let mut snapshot = snapshot();
        snapshot.users.retain(|u| u.id != 22);

        let err = build(&snapshot, &config()).unwrap_err();
        match err {
            BuildError::RowBinding { tag, position, .. } => {
                assert_eq!(tag, "cur_task");
                assert_eq!(position, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn absent_regions_are_skipped() {
        let mut engine = RecordingEngine::with_regions(["cur_task"]);
        generate(&snapshot(), &mut engine, &config(), &locale(), now(), 1).unwrap();

        assert_eq!(engine.merged_tags(), ["cur_task"]);
        assert!(engine.fields().is_some());
    }

    #[test]
    fn rejected_region_aborts_before_finalize() {
        let mut engine = RecordingEngine::permissive().rejecting("prev_task");
        let err = generate(&snapshot(), &mut engine, &config(), &locale(), now(), 1).unwrap_err();

        assert!(matches!(
            err,
            BuildError::TemplateRegion {
                source: TemplateError::RegionRejected { .. },
                ..
            }
        ));
        assert!(engine.fields().is_none());
    }

    #[test]
    fn attendants_segment() {
        let mut snapshot = snapshot();
        snapshot.signatories.push(SignatoryList {
            investigation: 1,
            signatories: vec![
                Signatory {
                    lastname: "bernard".into(),
                    firstname: "alice".into(),
                    job: "HSE manager".into(),
                    role: "Investigator".into(),
                    signature_date: ACCIDENT_AT + DAY,
                    attendance: Attendance::Present,
                },
                Signatory {
                    lastname: "petit".into(),
                    firstname: "marc".into(),
                    attendance: Attendance::Absent,
                    ..Signatory::default()
                },
            ],
        });

        let engine = build(&snapshot, &config()).unwrap();
        assert_eq!(engine.fields().unwrap().get("attendants_number"), Some("2"));

        let rows = engine.merged(ATTENDANT_TAG).unwrap().rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("attendant_lastname"), Some("BERNARD"));
        assert_eq!(rows[0].get("attendant_firstname"), Some("Alice"));
        assert_eq!(
            rows[0].get("attendant_signature_date"),
            Some("15/11/2023 22:13")
        );
        assert_eq!(rows[0].get("attendant_attendance"), Some("Présent"));
        assert_eq!(rows[1].get("attendant_signature_date"), Some(""));
        assert_eq!(rows[1].get("attendant_attendance"), Some("Absent"));
    }

    fn risk(id: EntityId, element: EntityId, cotation: u32) -> Risk {
        Risk {
            id,
            reference: format!("R{id}"),
            fk_element: element,
            category: "Chute de plain-pied".into(),
            cotation,
            ..Risk::default()
        }
    }

    /// Accident at work unit 5, under group 4, with a child unit 6.
    fn risk_snapshot() -> Snapshot {
        let mut snapshot = snapshot();
        snapshot.accidents[0].external_accident = 1;
        snapshot.accidents[0].fk_element = 5;
        let element = |id, reference: &str, parent| DigiriskElement {
            id,
            reference: reference.into(),
            label: format!("Element {id}"),
            parent,
        };
        snapshot.elements = vec![
            element(4, "GP4", None),
            element(5, "UT5", Some(4)),
            element(6, "UT6", Some(5)),
            element(8, "UT8", None),
        ];
        let shared_with = |mut risk: Risk, elements: Vec<EntityId>| {
            risk.shared_with = elements;
            risk
        };
        snapshot.risks = vec![
            risk(1, 5, 30),
            // Assessed on the accident's unit and shared out to unit 7.
            shared_with(risk(2, 5, 85), vec![7]),
            risk(3, 6, 49),
            risk(4, 4, 60),
            // Shared into the accident's unit from unit 8.
            shared_with(risk(5, 8, 90), vec![5]),
            // Shared between unrelated units only.
            shared_with(risk(6, 8, 95), vec![9]),
        ];
        snapshot
    }

    fn risk_refs(engine: &RecordingEngine, tag: &str) -> Vec<String> {
        engine
            .merged(tag)
            .unwrap()
            .rows()
            .iter()
            .map(|r| r.get("risk_ref").unwrap().to_string())
            .collect()
    }

    #[test]
    fn risks_of_element_and_descendants_by_level() {
        let engine = build(&risk_snapshot(), &config()).unwrap();

        assert_eq!(risk_refs(&engine, "risq1"), ["R1"]);
        assert_eq!(risk_refs(&engine, "risq2"), ["R3"]);
        assert_eq!(risk_refs(&engine, "risq3"), [""]);
        assert_eq!(risk_refs(&engine, "risq4"), ["R2"]);

        let row = &engine.merged("risq2").unwrap().rows()[0];
        assert_eq!(row.get("risk_element"), Some("UT6 - Element 6"));
        assert_eq!(row.get("risk_cotation"), Some("49"));
    }

    #[test]
    fn inherited_and_shared_risks_follow_config() {
        let mut config = config();
        config.risks = RiskVisibility {
            show_inherited: true,
            show_shared: true,
        };
        let engine = build(&risk_snapshot(), &config).unwrap();

        assert_eq!(risk_refs(&engine, "risq3"), ["R4"]);
        assert_eq!(risk_refs(&engine, "risq4"), ["R5", "R2"]);
    }

    #[test]
    fn shared_risks_come_only_from_the_accident_elements() {
        let mut config = config();
        config.risks.show_shared = true;
        let engine = build(&risk_snapshot(), &config).unwrap();

        assert_eq!(risk_refs(&engine, "risq3"), [""]);
        assert_eq!(risk_refs(&engine, "risq4"), ["R5", "R2"]);
        let row = &engine.merged("risq4").unwrap().rows()[0];
        assert_eq!(row.get("risk_element"), Some("UT8 - Element 8"));
    }

    #[test]
    fn no_element_means_blank_risk_rows() {
        let engine = build(&snapshot(), &config()).unwrap();
        for tag in ["risq1", "risq2", "risq3", "risq4"] {
            let rows = engine.merged(tag).unwrap();
            assert_eq!(rows.len(), 1);
            assert!(rows.rows()[0].iter().all(|(_, v)| v.is_empty()));
        }
    }

    #[test]
    fn renders_a_text_template() {
        let mut template = TextTemplate::parse(
            "{{gp_ut}} / {{accident_day}}\n\
             {{#each cur_task}}{{cur_task_ref}} {{cur_task_resp}}|{{/each}}\n\
             {{#each prev_task}}<{{prev_task_ref}}>{{/each}}\n\
             Budget: {{total_planned_budget}}",
        )
        .unwrap();

        let doc = generate(&snapshot(), &mut template, &config(), &locale(), now(), 1).unwrap();
        assert_eq!(
            doc.content,
            "Acme Corp / Mardi\nT111 MARTIN Paul|T112 DURAND Léa|T113 |\n<>\nBudget: 600,00"
        );
        assert_eq!(doc.images.len(), 1);
    }

    #[test]
    fn every_template_field_is_bound() {
        let assembly = assemble(&snapshot(), &config()).unwrap();
        for key in [
            "investigation_date_start",
            "investigation_date_end",
            "total_curative_action",
            "total_preventive_action",
            "total_planned_budget",
            "attendants_number",
            "mycompany_siret",
            "mycompany_contact",
            "mycompany_mail",
            "victim_lastname",
            "victim_firstname",
            "seniority_at_post",
            "victim_date_employment",
            "accident_date",
            "accident_hour",
            "accident_day",
            "gp_ut",
            "victim_skills",
            "collective_equipment",
            "individual_equipment",
            "circumstances",
            "public_note",
            "relative_location",
            "causality_tree_photo",
        ] {
            assert!(assembly.fields.contains_key(key), "{key}");
        }
    }

    #[test]
    fn task_cycle_is_rejected() {
        let mut snapshot = snapshot();
        // 113 points back at the root, which already contains it.
        snapshot.tasks.push(TaskNode {
            id: 100,
            parent: Some(113),
            ..TaskNode::default()
        });

        let err = assemble(&snapshot, &config()).unwrap_err();
        assert!(matches!(err, BuildError::StructuralInvariant { .. }));
    }

    #[test]
    fn finalize_failure_is_reported() {
        struct Broken;
        impl TemplateEngine for Broken {
            fn has_region(&self, _: &str) -> bool {
                false
            }
            fn merge_region(&mut self, tag: &str, _: &SegmentRowSet) -> core::result::Result<(), TemplateError> {
                Err(TemplateError::RegionNotFound(tag.to_string()))
            }
            fn finalize(
                &mut self,
                _: &PlaceholderMap,
                _: &[PathBuf],
            ) -> core::result::Result<BuiltDocument, TemplateError> {
                Err(TemplateError::Malformed("truncated".into()))
            }
        }

        let err = generate(&snapshot(), &mut Broken, &config(), &locale(), now(), 1).unwrap_err();
        assert!(matches!(err, BuildError::Finalize(TemplateError::Malformed(_))));
    }
}
