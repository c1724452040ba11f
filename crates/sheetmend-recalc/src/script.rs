//! Recalculation probe script rendering.
//!
//! The bridge drives the engine with a transient Basic script: open the
//! workbook hidden, force a full recalculation, walk every sheet's used
//! range, and write the cells whose displayed text is a known error literal
//! to a JSON artifact the host polls for.

use std::path::Path;

/// The error literals the probe script matches displayed values against.
///
/// Must stay in sync with `sheetmend_core::CellError::ALL`; the artifact
/// parser rejects anything outside that set, so a drift here surfaces as a
/// `MalformedOutput` rather than a wrong report.
const ERROR_LITERALS: &str = "\"#DIV/0!\", \"#REF!\", \"#VALUE!\", \"#NAME?\", \"#NULL!\", \"#NUM!\", \"#N/A\"";

/// Escape a string for embedding in a Basic string literal.
///
/// Basic doubles embedded double quotes; everything else passes through.
fn escape_basic(s: &str) -> String {
    s.replace('"', "\"\"")
}

/// Convert a filesystem path to the file URL the engine's loader expects.
fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

/// Render the probe script for one workbook/output pair.
pub fn render(workbook_path: &Path, output_path: &Path) -> String {
    let doc_url = escape_basic(&file_url(workbook_path));
    let out_path = escape_basic(&output_path.display().to_string());

    format!(
        r#"' Transient recalculation probe. Deleted by the host after the run.
Function EscapeJson(s As String) As String
    Dim r As String
    r = s
    r = Join(Split(r, "\"), "\\")
    r = Join(Split(r, """"), "\""")
    EscapeJson = r
End Function

Function ColumnLetters(n As Integer) As String
    Dim r As String
    Dim c As Integer
    c = n + 1
    Do While c > 0
        r = Chr(65 + ((c - 1) Mod 26)) & r
        c = (c - 1) \ 26
    Loop
    ColumnLetters = r
End Function

Sub RecalcProbe
    Dim oDesktop As Object, oDoc As Object, oSheets As Object, oSheet As Object
    Dim oCursor As Object, oCell As Object
    Dim sErrors As String, sJson As String
    Dim nTotal As Long, i As Integer, nRow As Long, nCol As Integer
    Dim aLiterals

    aLiterals = Array({literals})

    Dim oArgs(0) As New com.sun.star.beans.PropertyValue
    oArgs(0).Name = "Hidden"
    oArgs(0).Value = True

    oDesktop = createUnoService("com.sun.star.frame.Desktop")
    oDoc = oDesktop.loadComponentFromURL("{doc_url}", "_blank", 0, oArgs())
    oDoc.calculateAll()

    nTotal = 0
    sErrors = ""
    oSheets = oDoc.Sheets
    For i = 0 To oSheets.Count - 1
        oSheet = oSheets.getByIndex(i)
        oCursor = oSheet.createCursor()
        oCursor.gotoEndOfUsedArea(False)
        For nRow = 0 To oCursor.RangeAddress.EndRow
            For nCol = 0 To oCursor.RangeAddress.EndColumn
                oCell = oSheet.getCellByPosition(nCol, nRow)
                If Len(oCell.getFormula()) > 0 And Left(oCell.getFormula(), 1) = "=" Then
                    nTotal = nTotal + 1
                    Dim sShown As String
                    sShown = oCell.getString()
                    Dim j As Integer
                    For j = LBound(aLiterals) To UBound(aLiterals)
                        If sShown = aLiterals(j) Then
                            If Len(sErrors) > 0 Then sErrors = sErrors & ","
                            sErrors = sErrors & "{{""cell"": """ & EscapeJson(oSheet.Name) _
                                & "!" & ColumnLetters(nCol) & (nRow + 1) _
                                & """, ""value"": """ & EscapeJson(sShown) & """}}"
                        End If
                    Next j
                End If
            Next nCol
        Next nRow
    Next i

    oDoc.close(False)

    sJson = "{{""total_formulas"": " & nTotal & ", ""errors"": [" & sErrors & "]}}"

    Dim iFile As Integer
    iFile = Freefile
    Open "{out_path}" For Output As #iFile
    Print #iFile, sJson
    Close #iFile
End Sub
"#,
        literals = ERROR_LITERALS,
        doc_url = doc_url,
        out_path = out_path,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_escape_basic_doubles_quotes() {
        assert_eq!(escape_basic(r#"Bob's "Q1" sheet"#), r#"Bob's ""Q1"" sheet"#);
        assert_eq!(escape_basic("plain"), "plain");
    }

    #[test]
    fn test_render_embeds_paths() {
        let script = render(
            &PathBuf::from("/tmp/model.xlsx"),
            &PathBuf::from("/tmp/out.json"),
        );
        assert!(script.contains("file:///tmp/model.xlsx"));
        assert!(script.contains(r#"Open "/tmp/out.json" For Output"#));
        assert!(script.contains("calculateAll"));
    }

    #[test]
    fn test_render_escapes_quoted_path() {
        let script = render(
            &PathBuf::from(r#"/tmp/odd"name.xlsx"#),
            &PathBuf::from("/tmp/out.json"),
        );
        assert!(script.contains(r#"odd""name.xlsx"#));
    }

    #[test]
    fn test_render_covers_all_literals() {
        let script = render(&PathBuf::from("/a.xlsx"), &PathBuf::from("/a.json"));
        for e in sheetmend_core::CellError::ALL {
            assert!(script.contains(e.as_str()), "missing {}", e);
        }
    }
}
