use crate::registry::CompanyRecord;

/// Placeholder for fields the registry did not fill in.
const NOT_INFORMED: &str = "Não informado";

/// Map a size-classification code onto an estimated employee band.
///
/// Substring rules, first match wins. The registry sends free-ish text
/// ("MICRO EMPRESA", "DEMAIS", "ME", ...), so containment is the only
/// reliable test.
pub fn estimate_employees(porte: Option<&str>) -> &'static str {
    let Some(porte) = porte else {
        return NOT_INFORMED;
    };
    let porte = porte.trim().to_uppercase();

    // The registry sends "" for companies it has no size code for
    if porte.is_empty() {
        return NOT_INFORMED;
    }

    if porte.contains("MEI") {
        "1 funcionário"
    } else if porte.contains("MICRO") || porte.contains("ME") {
        "1 a 9 funcionários"
    } else if porte.contains("PEQUENO") || porte.contains("EPP") {
        "10 a 49 funcionários"
    } else {
        "50+ funcionários"
    }
}

/// Reshape a raw `ddd + number` string into `(dd) number`.
///
/// Strings of 2 chars or fewer have no area code to split off and pass
/// through untouched. An absent phone gets the placeholder, and so does an
/// empty string — the registry sends `""` rather than omitting the field.
pub fn format_phone(phone: Option<&str>) -> String {
    match phone.map(str::trim) {
        None | Some("") => NOT_INFORMED.to_string(),
        Some(p) if p.chars().count() > 2 => {
            let split = p.char_indices().nth(2).map(|(i, _)| i).unwrap_or(p.len());
            format!("({}) {}", &p[..split], &p[split..])
        }
        Some(p) => p.to_string(),
    }
}

/// Render one company as the emoji-decorated reply block.
///
/// Field order is fixed; every slot is always present, with placeholders
/// standing in for whatever the registry left out.
pub fn format_company(record: &CompanyRecord) -> String {
    let funcionarios = estimate_employees(record.porte.as_deref());
    let telefone = format_phone(record.ddd_telefone_1.as_deref());

    format!(
        "🏢 {}\n\
         🏷️ {}\n\
         📍 {} - {}\n\
         📊 {}\n\
         🏭 Ramo: {}\n\
         👥 Funcionários: {}\n\
         📞 {}\n",
        record.razao_social,
        record.nome_fantasia,
        record.municipio,
        record.uf,
        record.descricao_situacao_cadastral,
        record.cnae_fiscal_descricao,
        funcionarios,
        telefone,
    )
}
