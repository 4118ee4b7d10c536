use ameritrade_parser::AmeritradeParser;
use canaccord_parser::CanaccordParser;
use etrade_parser::EtradeParser;
use fidelity_parser::FidelityParser;
use models::SourceFormat;
use schwab_parser::SchwabParser;
use sprott_parser::SprottParser;
use utils::StatementParser;

/// The adapter for one export layout.
pub fn parser_for(format: SourceFormat) -> Box<dyn StatementParser> {
    match format {
        SourceFormat::Fidelity => Box::new(FidelityParser::new()),
        SourceFormat::Etrade => Box::new(EtradeParser::new()),
        SourceFormat::Schwab => Box::new(SchwabParser::new()),
        SourceFormat::Canaccord => Box::new(CanaccordParser::new()),
        SourceFormat::Ameritrade => Box::new(AmeritradeParser::new()),
        SourceFormat::Sprott => Box::new(SprottParser::new()),
    }
}

pub fn parsers_for(formats: &[SourceFormat]) -> Vec<Box<dyn StatementParser>> {
    formats.iter().map(|format| parser_for(*format)).collect()
}
