pub fn generate_starter_config() -> String {
    r#"# =============================================================================
# EVENTSEQ CONFIGURATION
# =============================================================================
# Turns raw log files into per-window event id sequences. Every dataset is
# parsed with the same template parser, templates are numbered once across
# all datasets (in the order listed below), and each dataset gets one output
# file with one line per time window.
#
# Config file locations (in order of precedence):
#   1. Path specified via --config argument
#   2. ~/.config/eventseq/config.yml
#   3. /etc/eventseq/config.yml
#
# Paths may start with ~ and may reference environment variables as $env{...}.

input_dir: ./data/access/
output_dir: ./result/
# Create output_dir when missing; if false a missing directory is an error
create_output_dir: true

# =============================================================================
# LINE STRUCTURE
# =============================================================================
# <Name> placeholders capture fields; everything else must match literally
# (runs of spaces match any whitespace). Lines that do not match abort the run.
log_format: '<IP> - - [<Date>:<Time> <Timezone>] "<Request>" <Status> <Size> "<Referrer>" "<UserAgent>"'

# Field whose content is turned into a template
message_field: Request

timestamp:
  # Fields joined into the timestamp string
  template: '<Date>:<Time> <Timezone>'
  # strptime format string, 'iso8601', 'epoch', or 'epoch_ms'
  format: '%d/%b/%Y:%H:%M:%S %z'

# =============================================================================
# TEMPLATES
# =============================================================================
parser:
  # 'spell' mines templates by longest common subsequence,
  # 'raw' uses the message field verbatim
  kind: spell
  # Fraction of a message that must be shared with a template to join it
  tau: 0.5
  # Regexes whose matches are replaced by <*> before mining
  preprocess:
    - '\d+\.\d+\.\d+\.\d+'

# =============================================================================
# WINDOWS & DATASETS
# =============================================================================
# Window width (whole seconds), e.g. 30s, 1m, 1h
window: 1m

datasets:
  - name: train
    file: access_normal1.log
    output: train
  - name: test_normal
    file: access_normal2.log
    output: test_normal
  - name: test_abnormal
    file: access_abnormal.log
    output: test_abnormal
"#
    .to_string()
}
